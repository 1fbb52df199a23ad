//! Scanner facade
//!
//! Wires transport, client, controller, poll loop and batch scheduler
//! together from a [`ScanConfig`] and exposes the operations front ends
//! need.

use mcscan_client::{CancellationToken, ResilientClient, ReqwestTransport, Transport};
use mcscan_core::dto::job::ActiveScans;
use mcscan_core::{JobHandle, JobRequest, JobResult, JobStatus};
use std::sync::Arc;
use tracing::info;

use crate::config::ScanConfig;
use crate::error::Result;
use crate::scheduler::{BatchMode, BatchOptions, BatchOutcome, BatchScheduler, PollLoop, PollOutcome};
use crate::service::{CancelAck, JobController};

/// Entry point for running scans against one backend
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
    controller: JobController,
    scheduler: BatchScheduler,
}

impl Scanner {
    /// Creates a scanner talking HTTP to `config.backend_url`
    pub fn from_config(config: ScanConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(config.backend_url.clone()));
        Self::with_transport(config, transport)
    }

    /// Creates a scanner on top of any transport
    pub fn with_transport(config: ScanConfig, transport: Arc<dyn Transport>) -> Self {
        let client = ResilientClient::with_transport(transport)
            .with_retry_policy(config.retry_policy())
            .with_timeout(config.request_timeout);
        let controller =
            JobController::new(Arc::new(client)).with_status_timeout(config.status_timeout);
        let scheduler = BatchScheduler::new(PollLoop::new(controller.clone(), config.poll_config()));

        info!("Scanner ready for {}", config.backend_url);
        Self {
            config,
            controller,
            scheduler,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn controller(&self) -> &JobController {
        &self.controller
    }

    pub async fn start_scan(&self, request: &JobRequest, cancel: &CancellationToken) -> Result<JobHandle> {
        self.controller.start(request, cancel).await
    }

    /// Polls a started scan until it settles
    pub async fn poll_status<F>(
        &self,
        handle: JobHandle,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> PollOutcome
    where
        F: FnMut(&JobStatus),
    {
        self.scheduler.poller().run(handle, cancel, on_progress).await
    }

    /// Starts a scan and polls it to completion
    pub async fn run_scan<F>(
        &self,
        request: &JobRequest,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<JobResult>
    where
        F: FnMut(&JobStatus),
    {
        let handle = self.start_scan(request, cancel).await?;
        self.poll_status(handle, cancel, on_progress)
            .await
            .into_result()
    }

    pub async fn scan_status(&self, job_id: &str) -> Result<JobStatus> {
        self.controller
            .get_status(job_id, &CancellationToken::new())
            .await
    }

    /// Results of a scan, checked against its current status first
    pub async fn scan_results(&self, job_id: &str) -> Result<JobResult> {
        let cancel = CancellationToken::new();
        let status = self.controller.get_status(job_id, &cancel).await?;
        self.controller.get_results(&status, &cancel).await
    }

    pub async fn cancel_scan(&self, job_id: &str) -> Result<CancelAck> {
        self.controller.cancel(job_id).await
    }

    pub async fn active_scans(&self) -> Result<ActiveScans> {
        self.controller.active_scans().await
    }

    /// Runs a batch; the chunk size defaults to the configured concurrency
    pub async fn run_batch(
        &self,
        requests: &[JobRequest],
        mode: BatchMode,
        mut options: BatchOptions,
    ) -> BatchOutcome {
        options.max_concurrency.get_or_insert(self.config.max_concurrency);
        self.scheduler.run(requests, mode, options).await
    }
}
