//! mcscan Core
//!
//! Core types and abstractions for remote scan-job orchestration.
//!
//! This crate contains:
//! - Domain types: scan jobs, handles, canonical status and results
//! - DTOs: wire shapes exchanged with the scan backend
//! - Normalization: raw status payloads into one canonical [`JobStatus`]

pub mod domain;
pub mod dto;
pub mod normalize;

pub use domain::job::{JobHandle, JobRequest, JobResult, JobStatus, ScanState};
pub use normalize::normalize;
