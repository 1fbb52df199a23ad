//! Poll loop
//!
//! Drives one started scan to a terminal state. Each tick is a single
//! status round trip; the loop sleeps on a timer in between and wakes early
//! when its cancellation token fires.

use mcscan_client::{CancellationToken, ClientError};
use mcscan_core::{JobHandle, JobResult, JobStatus, ScanState};
use std::fmt;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{CancelOrigin, Result, ScanError};
use crate::service::JobController;

/// Polling cadence and job-level deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between two status checks; the first check happens one
    /// interval after polling begins
    pub interval: Duration,
    /// Wall-clock budget for the whole poll
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1_000),
            timeout: Duration::from_millis(300_000),
        }
    }
}

/// States of the poll state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Idle | Self::Polling)
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Polling => "polling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

/// How a poll ended
#[derive(Debug)]
pub enum PollOutcome {
    /// The scan completed and its results were fetched
    Completed(JobResult),
    /// The scan failed remotely, or its status or results could not be read
    Failed { job_id: String, error: ScanError },
    /// Cancelled by the caller's token or by the backend
    Cancelled { job_id: String, origin: CancelOrigin },
    /// The deadline passed; the scan may still be running remotely
    TimedOut {
        job_id: String,
        elapsed: Duration,
        last_status: Option<JobStatus>,
    },
}

impl PollOutcome {
    pub fn state(&self) -> PollState {
        match self {
            Self::Completed(_) => PollState::Completed,
            Self::Failed { .. } => PollState::Failed,
            Self::Cancelled { .. } => PollState::Cancelled,
            Self::TimedOut { .. } => PollState::TimedOut,
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            Self::Completed(result) => &result.job_id,
            Self::Failed { job_id, .. }
            | Self::Cancelled { job_id, .. }
            | Self::TimedOut { job_id, .. } => job_id,
        }
    }

    /// Collapse into the result; every non-completed outcome becomes its
    /// own error variant
    pub fn into_result(self) -> Result<JobResult> {
        match self {
            Self::Completed(result) => Ok(result),
            Self::Failed { error, .. } => Err(error),
            Self::Cancelled { job_id, origin } => Err(ScanError::JobCancelled {
                job_id: Some(job_id),
                origin,
            }),
            Self::TimedOut {
                job_id, elapsed, ..
            } => Err(ScanError::PollTimeout { job_id, elapsed }),
        }
    }
}

/// Polls a single scan until it settles
#[derive(Debug, Clone)]
pub struct PollLoop {
    controller: JobController,
    config: PollConfig,
}

impl PollLoop {
    pub fn new(controller: JobController, config: PollConfig) -> Self {
        Self { controller, config }
    }

    pub fn controller(&self) -> &JobController {
        &self.controller
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Polls `handle` until the scan reaches a terminal state, the deadline
    /// passes or `cancel` fires
    ///
    /// `on_progress` sees every status read, including unchanged ones.
    /// While the scan is running the progress it sees never goes down.
    pub async fn run<F>(
        &self,
        handle: JobHandle,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> PollOutcome
    where
        F: FnMut(&JobStatus),
    {
        let job_id = handle.job_id;
        let started = Instant::now();
        let mut ticker = time::interval_at(started + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_status: Option<JobStatus> = None;
        let mut high_water = 0.0_f64;

        debug!("Scan {}: {} -> {}", job_id, PollState::Idle, PollState::Polling);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = ticker.tick() => {}
            }

            let elapsed = started.elapsed();
            if elapsed >= self.config.timeout {
                warn!(
                    "Scan {} still {} after {:?}, giving up",
                    job_id,
                    last_status.as_ref().map_or(ScanState::Pending, |s| s.status),
                    elapsed
                );
                return PollOutcome::TimedOut {
                    job_id,
                    elapsed,
                    last_status,
                };
            }

            if cancel.is_cancelled() {
                info!("Stopped polling scan {}: cancelled", job_id);
                return PollOutcome::Cancelled {
                    job_id,
                    origin: CancelOrigin::Local,
                };
            }

            let mut status = match self.controller.get_status(&job_id, cancel).await {
                Ok(status) => status,
                Err(error) => return Self::status_failure(job_id, error),
            };

            if status.status == ScanState::Running {
                status.progress = status.progress.max(high_water);
                high_water = status.progress;
            }
            on_progress(&status);

            match status.status {
                ScanState::Completed => {
                    return match self.controller.get_results(&status, cancel).await {
                        Ok(result) => {
                            info!("Scan {} completed", job_id);
                            PollOutcome::Completed(result)
                        }
                        Err(error) => Self::results_failure(job_id, error),
                    };
                }
                ScanState::Failed => {
                    let message = status
                        .error
                        .clone()
                        .unwrap_or_else(|| "scan failed without an error message".to_string());
                    warn!("Scan {} failed: {}", job_id, message);
                    return PollOutcome::Failed {
                        error: ScanError::JobFailed {
                            job_id: job_id.clone(),
                            message,
                        },
                        job_id,
                    };
                }
                ScanState::Cancelled => {
                    info!("Scan {} was cancelled by the backend", job_id);
                    return PollOutcome::Cancelled {
                        job_id,
                        origin: CancelOrigin::Remote,
                    };
                }
                ScanState::Pending | ScanState::Running => {}
            }

            last_status = Some(status);
        }
    }

    fn status_failure(job_id: String, error: ScanError) -> PollOutcome {
        match error {
            ScanError::Client(ClientError::Cancelled) => PollOutcome::Cancelled {
                job_id,
                origin: CancelOrigin::Local,
            },
            ScanError::Client(source) => {
                warn!("Lost track of scan {}: {}", job_id, source);
                PollOutcome::Failed {
                    error: ScanError::StatusUnavailable {
                        job_id: job_id.clone(),
                        source,
                    },
                    job_id,
                }
            }
            error => PollOutcome::Failed { job_id, error },
        }
    }

    fn results_failure(job_id: String, error: ScanError) -> PollOutcome {
        match error {
            ScanError::Client(ClientError::Cancelled) => PollOutcome::Cancelled {
                job_id,
                origin: CancelOrigin::Local,
            },
            ScanError::Client(source) => {
                warn!("Scan {} completed but its results are unavailable: {}", job_id, source);
                PollOutcome::Failed {
                    error: ScanError::ResultsUnavailable {
                        job_id: job_id.clone(),
                        source,
                    },
                    job_id,
                }
            }
            error => PollOutcome::Failed { job_id, error },
        }
    }
}
