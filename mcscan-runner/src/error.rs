//! Orchestration errors
//!
//! [`ScanError`] is what the controller, poll loop and batch scheduler hand
//! back. Each variant maps to a stable [`ErrorKind`] code so a front end can
//! tell success, retryable failure and "still running remotely, client gave
//! up" apart without inspecting messages.

use mcscan_client::ClientError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Who cancelled a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOrigin {
    /// The caller's cancellation token fired
    Local,
    /// The backend reported the scan as cancelled
    Remote,
}

impl fmt::Display for CancelOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("locally"),
            Self::Remote => f.write_str("by the backend"),
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Timeout,
    HttpClient,
    HttpServer,
    Rejected,
    Parse,
    Unknown,
    ScanStart,
    ScanStatus,
    ScanResults,
    ScanFailed,
    ScanCancelled,
    ScanTimeout,
    Precondition,
    BatchPartialFailure,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT_ERROR",
            Self::HttpClient => "HTTP_CLIENT_ERROR",
            Self::HttpServer => "HTTP_SERVER_ERROR",
            Self::Rejected => "REQUEST_REJECTED",
            Self::Parse => "PARSE_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
            Self::ScanStart => "SCAN_START_ERROR",
            Self::ScanStatus => "SCAN_STATUS_ERROR",
            Self::ScanResults => "SCAN_RESULTS_ERROR",
            Self::ScanFailed => "SCAN_FAILED",
            Self::ScanCancelled => "SCAN_CANCELLED",
            Self::ScanTimeout => "SCAN_TIMEOUT",
            Self::Precondition => "PRECONDITION_FAILED",
            Self::BatchPartialFailure => "BATCH_PARTIAL_FAILURE",
        }
    }

    fn of_client(error: &ClientError) -> Self {
        match error {
            ClientError::Network(_) => Self::Network,
            ClientError::Timeout { .. } => Self::Timeout,
            ClientError::HttpClient { .. } => Self::HttpClient,
            ClientError::HttpServer { .. } => Self::HttpServer,
            ClientError::Rejected { .. } => Self::Rejected,
            ClientError::Parse(_) => Self::Parse,
            ClientError::Cancelled => Self::ScanCancelled,
            ClientError::Unknown(_) => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors produced while running scans
#[derive(Debug, Error)]
pub enum ScanError {
    /// A direct backend call failed after the client's own retries
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The start response did not contain a scan id
    #[error("Scan start response carried no scan id: {response}")]
    JobStart { response: String },

    /// Polling could not read the scan's status
    #[error("Status of scan {job_id} unavailable: {source}")]
    StatusUnavailable {
        job_id: String,
        source: ClientError,
    },

    /// The scan completed but its results could not be fetched
    #[error("Results of scan {job_id} unavailable: {source}")]
    ResultsUnavailable {
        job_id: String,
        source: ClientError,
    },

    /// The backend reported the scan as failed
    #[error("Scan {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    /// Cancelled locally or by the backend; `job_id` is `None` when the
    /// scan was never started
    #[error("Scan {} cancelled {origin}", .job_id.as_deref().unwrap_or("<not started>"))]
    JobCancelled {
        job_id: Option<String>,
        origin: CancelOrigin,
    },

    /// The client stopped waiting; the scan may still be running remotely
    #[error("Scan {job_id} still running after {}ms, stopped polling", .elapsed.as_millis())]
    PollTimeout { job_id: String, elapsed: Duration },

    /// An operation was called in a state that does not allow it
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Some scans of a batch failed
    #[error("{} of {total} scans failed", .failures.len())]
    BatchPartialFailure {
        total: usize,
        failures: Vec<(usize, ScanError)>,
    },
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Client(error) => ErrorKind::of_client(error),
            Self::JobStart { .. } => ErrorKind::ScanStart,
            Self::StatusUnavailable { .. } => ErrorKind::ScanStatus,
            Self::ResultsUnavailable { .. } => ErrorKind::ScanResults,
            Self::JobFailed { .. } => ErrorKind::ScanFailed,
            Self::JobCancelled { .. } => ErrorKind::ScanCancelled,
            Self::PollTimeout { .. } => ErrorKind::ScanTimeout,
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::BatchPartialFailure { .. } => ErrorKind::BatchPartialFailure,
        }
    }

    /// Whether retrying the same operation later could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Client(source)
            | Self::StatusUnavailable { source, .. }
            | Self::ResultsUnavailable { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::JobCancelled { .. })
            || matches!(self, Self::Client(error) if error.is_cancelled())
    }

    /// Scan the error belongs to, when known
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::StatusUnavailable { job_id, .. }
            | Self::ResultsUnavailable { job_id, .. }
            | Self::JobFailed { job_id, .. }
            | Self::PollTimeout { job_id, .. } => Some(job_id.as_str()),
            Self::JobCancelled { job_id, .. } => job_id.as_deref(),
            _ => None,
        }
    }
}
