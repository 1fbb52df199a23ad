//! Scan-related API endpoints

use mcscan_core::dto::job::{ActiveScans, StartScan};
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::{ApiResponse, Method, RequestOptions, ResilientClient};

impl ResilientClient {
    // =============================================================================
    // Scan Lifecycle
    // =============================================================================

    /// Start a directory scan on the backend
    ///
    /// # Arguments
    /// * `req` - The scan to start
    /// * `options` - Per-call timeout, retry and cancellation overrides
    ///
    /// # Returns
    /// The raw start response; the scan id lives in `data.scan_id` (or one
    /// of its aliases)
    ///
    /// # Example
    /// ```no_run
    /// # use mcscan_client::{RequestOptions, ResilientClient};
    /// # use mcscan_core::{JobRequest, dto::job::StartScan};
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ResilientClient::new("http://localhost:18000/api/v1");
    /// let request = JobRequest::new("/instances/pack/mods").full();
    /// let response = client
    ///     .start_scan(&StartScan::from(&request), &RequestOptions::default())
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_scan(&self, req: &StartScan, options: &RequestOptions) -> Result<ApiResponse> {
        let body = serde_json::to_value(req)
            .map_err(|e| ClientError::Parse(format!("Failed to encode scan request: {}", e)))?;

        self.request(Method::POST, "/scan/start", Some(body), options)
            .await
    }

    /// Get the raw status of a scan
    ///
    /// # Arguments
    /// * `scan_id` - The scan id returned by [`ResilientClient::start_scan`]
    pub async fn scan_status(&self, scan_id: &str, options: &RequestOptions) -> Result<ApiResponse> {
        let path = format!("/scan/status/{}", scan_id);
        self.request(Method::GET, &path, None, options).await
    }

    /// Get the result document of a finished scan
    ///
    /// # Arguments
    /// * `scan_id` - The scan id
    pub async fn scan_results(&self, scan_id: &str, options: &RequestOptions) -> Result<ApiResponse> {
        let path = format!("/scan/results/{}", scan_id);
        self.request(Method::GET, &path, None, options).await
    }

    /// Ask the backend to cancel a scan
    ///
    /// # Arguments
    /// * `scan_id` - The scan id
    pub async fn cancel_scan(&self, scan_id: &str, options: &RequestOptions) -> Result<ApiResponse> {
        let path = format!("/scan/cancel/{}", scan_id);
        self.request(Method::POST, &path, None, options).await
    }

    // =============================================================================
    // Scan Query
    // =============================================================================

    /// List scans the backend currently runs
    pub async fn active_scans(&self, options: &RequestOptions) -> Result<ActiveScans> {
        let response = self.request(Method::GET, "/scan/active", None, options).await?;

        match response.into_data() {
            Value::Null => Ok(ActiveScans::default()),
            data => serde_json::from_value(data)
                .map_err(|e| ClientError::Parse(format!("Failed to parse active scans: {}", e))),
        }
    }
}
