//! Service layer
//!
//! Services wrap the backend client with scan semantics: extracting ids
//! from start responses, normalizing status payloads and guarding result
//! and cancel calls against the job's state.

mod controller;

pub use controller::{CancelAck, JobController};
