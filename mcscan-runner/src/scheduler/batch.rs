//! Batch scheduler
//!
//! Runs many scans either one after another or in bounded chunks. A failed
//! scan is recorded and never stops the rest of the batch; the outcome
//! always holds one entry per request, in request order.

use futures::future::join_all;
use mcscan_client::{CancellationToken, ClientError};
use mcscan_core::{JobRequest, JobResult};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::events::{BatchEvent, EventSink};
use super::poller::PollLoop;
use crate::error::{CancelOrigin, Result, ScanError};

/// How the jobs of a batch are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// One job at a time, in request order
    Sequential,
    /// Consecutive chunks of `max_concurrency` jobs, each chunk settled
    /// before the next starts
    #[default]
    Concurrent,
}

/// Options of a single batch run
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Chunk size in concurrent mode; `None` uses the scheduler default
    pub max_concurrency: Option<usize>,
    /// Aborts in-flight jobs and skips the ones not started yet
    pub cancel: CancellationToken,
    /// Receives per-job events
    pub events: Option<UnboundedSender<BatchEvent>>,
}

impl BatchOptions {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    pub fn with_cancel(mut self, cancel: &CancellationToken) -> Self {
        self.cancel = cancel.clone();
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<BatchEvent>) -> Self {
        self.events = Some(events);
        self
    }
}

/// Outcome of one job of a batch
#[derive(Debug)]
pub struct BatchEntry {
    /// Position of the job in the request slice
    pub index: usize,
    pub result: Result<JobResult>,
}

/// Outcome of a whole batch, one entry per request
#[derive(Debug)]
pub struct BatchOutcome {
    entries: Vec<BatchEntry>,
}

impl BatchOutcome {
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = (usize, &JobResult)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.result.as_ref().ok().map(|result| (entry.index, result)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &ScanError)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.result.as_ref().err().map(|error| (entry.index, error)))
    }

    pub fn all_succeeded(&self) -> bool {
        self.entries.iter().all(|entry| entry.result.is_ok())
    }

    /// All results in request order, or [`ScanError::BatchPartialFailure`]
    /// carrying every failed index
    pub fn into_result(self) -> Result<Vec<JobResult>> {
        let total = self.entries.len();
        let mut results = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for entry in self.entries {
            match entry.result {
                Ok(result) => results.push(result),
                Err(error) => failures.push((entry.index, error)),
            }
        }

        if failures.is_empty() {
            Ok(results)
        } else {
            Err(ScanError::BatchPartialFailure { total, failures })
        }
    }
}

/// Runs batches of scans through a [`PollLoop`]
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    poller: PollLoop,
}

impl BatchScheduler {
    pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

    pub fn new(poller: PollLoop) -> Self {
        Self { poller }
    }

    pub fn poller(&self) -> &PollLoop {
        &self.poller
    }

    /// Runs every request and collects one entry per request
    ///
    /// A `max_concurrency` of 0 is treated as 1.
    pub async fn run(
        &self,
        requests: &[JobRequest],
        mode: BatchMode,
        options: BatchOptions,
    ) -> BatchOutcome {
        let sink = EventSink::new(options.events);
        let cancel = options.cancel;
        let mut entries = Vec::with_capacity(requests.len());

        info!("Running batch of {} scan(s) ({:?})", requests.len(), mode);

        match mode {
            BatchMode::Sequential => {
                for (index, request) in requests.iter().enumerate() {
                    let result = self.run_job(index, request, &cancel, &sink).await;
                    entries.push(BatchEntry { index, result });
                }
            }
            BatchMode::Concurrent => {
                let chunk_size = options
                    .max_concurrency
                    .unwrap_or(Self::DEFAULT_MAX_CONCURRENCY)
                    .max(1);

                for (chunk_no, chunk) in requests.chunks(chunk_size).enumerate() {
                    let offset = chunk_no * chunk_size;
                    debug!(
                        "Starting chunk {} ({} scan(s) from index {})",
                        chunk_no + 1,
                        chunk.len(),
                        offset
                    );

                    let jobs = chunk.iter().enumerate().map(|(i, request)| {
                        let index = offset + i;
                        let (cancel, sink) = (&cancel, &sink);
                        async move {
                            let result = self.run_job(index, request, cancel, sink).await;
                            BatchEntry { index, result }
                        }
                    });
                    entries.extend(join_all(jobs).await);
                }
            }
        }

        let outcome = BatchOutcome { entries };
        let failed = outcome.failures().count();
        if failed > 0 {
            warn!("Batch finished: {} of {} scan(s) failed", failed, outcome.len());
        } else {
            info!("Batch finished: {} scan(s) completed", outcome.len());
        }
        outcome
    }

    async fn run_job(
        &self,
        index: usize,
        request: &JobRequest,
        cancel: &CancellationToken,
        sink: &EventSink,
    ) -> Result<JobResult> {
        let result = self.start_and_poll(index, request, cancel, sink).await;

        match &result {
            Ok(result) => sink.emit(BatchEvent::Completed {
                index,
                result: result.clone(),
            }),
            Err(error) => {
                warn!("Scan #{} ({}) did not complete: {}", index, request.directory, error);
                sink.emit(BatchEvent::failed(index, error));
            }
        }
        result
    }

    async fn start_and_poll(
        &self,
        index: usize,
        request: &JobRequest,
        cancel: &CancellationToken,
        sink: &EventSink,
    ) -> Result<JobResult> {
        let never_started = ScanError::JobCancelled {
            job_id: None,
            origin: CancelOrigin::Local,
        };

        if cancel.is_cancelled() {
            debug!("Skipping scan #{} ({}): batch cancelled", index, request.directory);
            return Err(never_started);
        }

        let handle = match self.poller.controller().start(request, cancel).await {
            Ok(handle) => handle,
            Err(ScanError::Client(ClientError::Cancelled)) => return Err(never_started),
            Err(error) => return Err(error),
        };

        sink.emit(BatchEvent::Started {
            index,
            job_id: handle.job_id.clone(),
        });

        self.poller
            .run(handle, cancel, |status| {
                sink.emit(BatchEvent::Progress {
                    index,
                    status: status.clone(),
                })
            })
            .await
            .into_result()
    }
}
