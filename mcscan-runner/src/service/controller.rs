//! Job controller
//!
//! Starts scans, reads their normalized status, cancels them and fetches
//! their results. Every call goes through the shared [`ResilientClient`],
//! so transient failures are already retried by the time an error reaches
//! the caller.

use mcscan_client::{CancellationToken, RequestOptions, ResilientClient};
use mcscan_core::dto::job::{ActiveScans, StartScan, extract_job_id};
use mcscan_core::{JobHandle, JobRequest, JobResult, JobStatus, ScanState, normalize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Result, ScanError};

/// Acknowledgement of a cancel request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelAck {
    pub job_id: String,
    /// State the backend reported after the request
    pub status: ScanState,
    /// The scan had already settled, so no cancel call was issued
    pub already_terminal: bool,
}

/// Controls individual scan jobs on the backend
#[derive(Debug, Clone)]
pub struct JobController {
    client: Arc<ResilientClient>,
    status_timeout: Duration,
}

impl JobController {
    pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a controller on top of a shared client
    pub fn new(client: Arc<ResilientClient>) -> Self {
        Self {
            client,
            status_timeout: Self::DEFAULT_STATUS_TIMEOUT,
        }
    }

    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    /// Starts a scan
    ///
    /// # Returns
    /// A handle carrying the backend's scan id
    ///
    /// # Errors
    /// [`ScanError::JobStart`] when the response holds none of `scan_id`,
    /// `job_id` or `task_id`, in `data` or at the top level
    pub async fn start(&self, request: &JobRequest, cancel: &CancellationToken) -> Result<JobHandle> {
        let options = RequestOptions::default().with_cancel(cancel);
        let response = self
            .client
            .start_scan(&StartScan::from(request), &options)
            .await?;

        let job_id = extract_job_id(&response.body).ok_or_else(|| ScanError::JobStart {
            response: response.body.to_string(),
        })?;

        info!("Started scan {} for {}", job_id, request.directory);
        Ok(JobHandle::new(job_id))
    }

    /// Reads the current status of a scan
    ///
    /// Uses the short status timeout so a slow backend cannot stall a poll
    /// tick for longer than one request.
    pub async fn get_status(&self, job_id: &str, cancel: &CancellationToken) -> Result<JobStatus> {
        let options = RequestOptions::default()
            .with_timeout(self.status_timeout)
            .with_cancel(cancel);
        let response = self.client.scan_status(job_id, &options).await?;
        let status = normalize(job_id, response.data());

        debug!(
            "Scan {}: {} {:.1}% ({}/{})",
            job_id, status.status, status.progress, status.processed_items, status.total_items
        );
        Ok(status)
    }

    /// Cancels a scan
    ///
    /// Idempotent: a scan that already reached a terminal state is left
    /// alone and reported as such.
    pub async fn cancel(&self, job_id: &str) -> Result<CancelAck> {
        let current = self.get_status(job_id, &CancellationToken::new()).await?;
        if current.is_terminal() {
            info!("Scan {} already {}, nothing to cancel", job_id, current.status);
            return Ok(CancelAck {
                job_id: job_id.to_string(),
                status: current.status,
                already_terminal: true,
            });
        }

        let response = self
            .client
            .cancel_scan(job_id, &RequestOptions::default())
            .await?;
        let status = response
            .data()
            .get("status")
            .and_then(Value::as_str)
            .map(ScanState::parse)
            .unwrap_or(ScanState::Cancelled);

        info!("Cancel requested for scan {} (now {})", job_id, status);
        Ok(CancelAck {
            job_id: job_id.to_string(),
            status,
            already_terminal: false,
        })
    }

    /// Fetches the results of a completed scan
    ///
    /// # Arguments
    /// * `status` - The last status observed for the scan
    ///
    /// # Errors
    /// [`ScanError::Precondition`] unless `status` says the scan completed
    pub async fn get_results(&self, status: &JobStatus, cancel: &CancellationToken) -> Result<JobResult> {
        if status.status != ScanState::Completed {
            return Err(ScanError::Precondition(format!(
                "results of scan {} requested while it is {}",
                status.job_id, status.status
            )));
        }

        let options = RequestOptions::default().with_cancel(cancel);
        let response = self.client.scan_results(&status.job_id, &options).await?;

        Ok(JobResult {
            job_id: status.job_id.clone(),
            payload: response.into_data(),
        })
    }

    /// Lists scans the backend is currently running
    pub async fn active_scans(&self) -> Result<ActiveScans> {
        Ok(self.client.active_scans(&RequestOptions::default()).await?)
    }
}
