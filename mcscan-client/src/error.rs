//! Error types for the mcscan client

use std::time::Duration;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the scan backend
///
/// Every failure of a request is classified into exactly one variant so the
/// retry loop and callers can decide what to do without string matching.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection-level failure (refused, reset, DNS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not finish within its timeout
    #[error("Request timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Timeout that was applied to the attempt
        timeout: Duration,
    },

    /// Backend answered with a 4xx status
    #[error("HTTP client error (status {status}): {message}")]
    HttpClient {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// Backend answered with a 5xx status
    #[error("HTTP server error (status {status}): {message}")]
    HttpServer {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// Backend answered 2xx but with `success: false`
    #[error("Request rejected by backend: {message}")]
    Rejected {
        /// Message from the response envelope
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// Anything that fits no other class, e.g. an unexpected 3xx
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ClientError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400..=499 => Self::HttpClient { status, message },
            500..=599 => Self::HttpServer { status, message },
            _ => Self::Unknown(format!("unexpected status {}: {}", status, message)),
        }
    }

    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout { .. } | Self::HttpServer { .. }
        )
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpClient { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::HttpClient { .. })
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::HttpServer { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpClient { status, .. } | Self::HttpServer { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(ClientError::from_status(404, "missing").is_client_error());
        assert!(ClientError::from_status(404, "missing").is_not_found());
        assert!(ClientError::from_status(503, "busy").is_server_error());
        assert!(matches!(
            ClientError::from_status(302, "moved"),
            ClientError::Unknown(_)
        ));
    }

    #[test]
    fn test_retryable_classes() {
        assert!(ClientError::Network("reset".into()).is_retryable());
        assert!(
            ClientError::Timeout {
                timeout: Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(ClientError::from_status(500, "boom").is_retryable());

        assert!(!ClientError::from_status(400, "bad").is_retryable());
        assert!(!ClientError::Rejected { message: "no".into() }.is_retryable());
        assert!(!ClientError::Parse("junk".into()).is_retryable());
        assert!(!ClientError::Cancelled.is_retryable());
        assert!(!ClientError::Unknown("?".into()).is_retryable());
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(ClientError::from_status(429, "slow down").status(), Some(429));
        assert_eq!(ClientError::Cancelled.status(), None);
    }
}
