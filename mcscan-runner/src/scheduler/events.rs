//! Batch progress events

use mcscan_core::{JobResult, JobStatus};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{ErrorKind, ScanError};

/// What happened to one job of a batch
///
/// `index` is the job's position in the request slice. Every job of a
/// batch gets exactly one terminal event, [`BatchEvent::Completed`] or
/// [`BatchEvent::Failed`], including jobs skipped by cancellation.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        index: usize,
        job_id: String,
    },
    Progress {
        index: usize,
        status: JobStatus,
    },
    Completed {
        index: usize,
        result: JobResult,
    },
    Failed {
        index: usize,
        job_id: Option<String>,
        kind: ErrorKind,
        message: String,
    },
}

impl BatchEvent {
    pub fn index(&self) -> usize {
        match self {
            Self::Started { index, .. }
            | Self::Progress { index, .. }
            | Self::Completed { index, .. }
            | Self::Failed { index, .. } => *index,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    pub(crate) fn failed(index: usize, error: &ScanError) -> Self {
        Self::Failed {
            index,
            job_id: error.job_id().map(str::to_string),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Optional event channel; a dropped receiver is not an error
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink {
    tx: Option<UnboundedSender<BatchEvent>>,
}

impl EventSink {
    pub(crate) fn new(tx: Option<UnboundedSender<BatchEvent>>) -> Self {
        Self { tx }
    }

    pub(crate) fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
