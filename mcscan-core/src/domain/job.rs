//! Scan job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scan to submit to the backend
///
/// Immutable once submitted; the batch scheduler only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Directory the backend worker should scan
    pub directory: String,
    /// Only rescan files changed since the previous scan
    pub incremental: bool,
    /// Project the scan belongs to, if any
    pub project_id: Option<String>,
}

impl JobRequest {
    /// Creates an incremental scan request for a directory
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            incremental: true,
            project_id: None,
        }
    }

    pub fn full(mut self) -> Self {
        self.incremental = false;
        self
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}

/// Handle to a job the backend accepted
///
/// Handed out by the job controller and consumed by the poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.job_id)
    }
}

/// Scan execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ScanState {
    /// Parses a backend status string
    ///
    /// Matching is case-insensitive and accepts the aliases the backend
    /// has used over time. Anything unrecognised is `Pending`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" | "scanning" | "processing" => Self::Running,
            "completed" | "complete" | "succeeded" | "success" => Self::Completed,
            "failed" | "error" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    /// Whether no further transitions can occur
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical job status
///
/// Produced by [`crate::normalize`] on every poll, whatever shape the
/// backend used for its progress fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: ScanState,
    /// Percent complete, always within `0.0..=100.0`
    pub progress: f64,
    pub processed_items: u64,
    /// Zero while the backend has not counted the work yet
    pub total_items: u64,
    pub current_item: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl JobStatus {
    /// A freshly submitted job with nothing reported yet
    pub fn pending(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: ScanState::Pending,
            progress: 0.0,
            processed_items: 0,
            total_items: 0,
            current_item: None,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Final payload of a completed scan
///
/// The payload is the backend's result document, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_state_parse_aliases() {
        assert_eq!(ScanState::parse("scanning"), ScanState::Running);
        assert_eq!(ScanState::parse("RUNNING"), ScanState::Running);
        assert_eq!(ScanState::parse("completed"), ScanState::Completed);
        assert_eq!(ScanState::parse("canceled"), ScanState::Cancelled);
        assert_eq!(ScanState::parse("error"), ScanState::Failed);
        assert_eq!(ScanState::parse("started"), ScanState::Pending);
        assert_eq!(ScanState::parse("what"), ScanState::Pending);
        assert_eq!(ScanState::parse(""), ScanState::Pending);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ScanState::Pending.is_terminal());
        assert!(!ScanState::Running.is_terminal());
        assert!(ScanState::Completed.is_terminal());
        assert!(ScanState::Failed.is_terminal());
        assert!(ScanState::Cancelled.is_terminal());
    }

    #[test]
    fn test_scan_state_serializes_lowercase() {
        let json = serde_json::to_string(&ScanState::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn test_job_request_builders() {
        let request = JobRequest::new("/mods").full().with_project("p1");
        assert_eq!(request.directory, "/mods");
        assert!(!request.incremental);
        assert_eq!(request.project_id.as_deref(), Some("p1"));
        assert!(JobRequest::new("/mods").incremental);
    }
}
