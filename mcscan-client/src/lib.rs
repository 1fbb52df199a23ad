//! mcscan HTTP Client
//!
//! A resilient HTTP client for the scan backend. Every request gets a
//! timeout, failures are classified into [`ClientError`] variants, and
//! transient failures (network errors, timeouts, 5xx) are retried with
//! bounded exponential backoff according to a [`RetryPolicy`].
//!
//! # Example
//!
//! ```no_run
//! use mcscan_client::{RequestOptions, ResilientClient};
//! use mcscan_core::JobRequest;
//! use mcscan_core::dto::job::StartScan;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ResilientClient::new("http://localhost:18000/api/v1");
//!
//!     let request = JobRequest::new("/games/modpack/mods");
//!     let response = client
//!         .start_scan(&StartScan::from(&request), &RequestOptions::default())
//!         .await?;
//!
//!     println!("Backend answered: {}", response.data());
//!     Ok(())
//! }
//! ```

pub mod error;
mod retry;
mod scans;
mod transport;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use reqwest::Method;
pub use retry::RetryPolicy;
pub use tokio_util::sync::CancellationToken;
pub use transport::{ApiRequest, RawResponse, ReqwestTransport, Transport};

use mcscan_core::dto::job::is_rejected;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Per-call overrides for [`ResilientClient::request`]
///
/// Anything left unset falls back to the client's defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub retry: Option<RetryPolicy>,
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_cancel(mut self, cancel: &CancellationToken) -> Self {
        self.cancel = Some(cancel.clone());
        self
    }
}

/// A successful backend response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// The full JSON body, envelope included
    pub body: Value,
}

impl ApiResponse {
    /// The envelope's `data`, or the whole body when there is none
    pub fn data(&self) -> &Value {
        match self.body.get("data") {
            Some(data) if !data.is_null() => data,
            _ => &self.body,
        }
    }

    pub fn into_data(self) -> Value {
        match self.body {
            Value::Object(mut fields) => match fields.remove("data") {
                Some(data) if !data.is_null() => data,
                _ => Value::Object(fields),
            },
            other => other,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

/// HTTP client for the scan backend with timeout and retry handling
#[derive(Clone)]
pub struct ResilientClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClient")
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ResilientClient {
    /// Default timeout applied to each attempt
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client talking HTTP to `base_url`
    ///
    /// # Example
    /// ```
    /// use mcscan_client::ResilientClient;
    ///
    /// let client = ResilientClient::new("http://localhost:18000/api/v1");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new(base_url)))
    }

    /// Create a client on top of any transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request, retrying transient failures
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            body,
        };
        self.execute(&request, options).await
    }

    /// Run the attempt/backoff loop for one request
    ///
    /// 4xx, rejected and unparseable responses return immediately. Network
    /// errors, timeouts and 5xx are retried up to `max_retries` times, after
    /// which the last error is returned. Cancellation wins over both the
    /// in-flight attempt and the backoff sleep.
    pub async fn execute(&self, request: &ApiRequest, options: &RequestOptions) -> Result<ApiResponse> {
        let policy = options.retry.unwrap_or(self.retry);
        let timeout = options.timeout.unwrap_or(self.timeout);
        let cancel = options.cancel.as_ref();
        let mut retries = 0;

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(ClientError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancelled(cancel) => return Err(ClientError::Cancelled),
                outcome = self.attempt(request, timeout) => outcome,
            };

            let err = match outcome {
                Ok(response) => {
                    if retries > 0 {
                        info!(
                            "{} {} succeeded after {} retr{}",
                            request.method,
                            request.path,
                            retries,
                            if retries == 1 { "y" } else { "ies" }
                        );
                    }
                    return Ok(response);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                debug!("{} {} failed: {}", request.method, request.path, err);
                return Err(err);
            }

            let next = retries + 1;
            if !policy.allows(next) {
                error!(
                    "{} {} failed after {} retries: {}",
                    request.method, request.path, retries, err
                );
                return Err(err);
            }

            let delay = policy.delay_for_attempt(next);
            warn!(
                "{} {} failed (retry {}/{} in {:?}): {}",
                request.method, request.path, next, policy.max_retries, delay, err
            );

            tokio::select! {
                biased;
                _ = cancelled(cancel) => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            retries = next;
        }
    }

    async fn attempt(&self, request: &ApiRequest, timeout: Duration) -> Result<ApiResponse> {
        let raw = tokio::time::timeout(timeout, self.transport.send(request, timeout))
            .await
            .map_err(|_| ClientError::Timeout { timeout })??;

        Self::handle_response(raw)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Classify a raw response and parse its JSON body
    ///
    /// Non-2xx statuses become HTTP errors. A 2xx body whose envelope says
    /// `success: false` is a [`ClientError::Rejected`].
    fn handle_response(raw: RawResponse) -> Result<ApiResponse> {
        if !(200..300).contains(&raw.status) {
            return Err(ClientError::from_status(raw.status, error_message(&raw.body)));
        }

        let body: Value = if raw.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw.body)
                .map_err(|e| ClientError::Parse(format!("Failed to parse JSON response: {}", e)))?
        };

        if is_rejected(&body) {
            return Err(ClientError::Rejected {
                message: message_field(&body)
                    .unwrap_or_else(|| "backend reported success=false".to_string()),
            });
        }

        Ok(ApiResponse {
            status: raw.status,
            body,
        })
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Best human-readable message from an error body
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    match parsed.as_ref().and_then(message_field) {
        Some(message) => message,
        None if body.trim().is_empty() => "Unknown error".to_string(),
        None => body.trim().to_string(),
    }
}

/// First of `message`, `detail` or `error`, rendered as text whatever its type
fn message_field(json: &Value) -> Option<String> {
    ["message", "detail", "error"]
        .iter()
        .filter_map(|key| json.get(*key))
        .find_map(|value| match value {
            Value::String(text) => Some(text.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
}
