//! mcscan Runner
//!
//! Orchestrates scans on a remote backend: starts them, polls them to a
//! terminal state and runs batches of them with bounded concurrency.
//!
//! Architecture:
//! - Configuration: settings from environment or defaults
//! - Services: job control on top of the resilient client
//! - Scheduler: single-scan polling and batch scheduling
//! - Scanner: facade wiring everything from one [`ScanConfig`]
//!
//! # Example
//!
//! ```no_run
//! use mcscan_core::JobRequest;
//! use mcscan_runner::{CancellationToken, ScanConfig, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scanner = Scanner::from_config(ScanConfig::from_env());
//!     let result = scanner
//!         .run_scan(
//!             &JobRequest::new("/games/modpack/mods"),
//!             &CancellationToken::new(),
//!             |status| println!("{:.0}%", status.progress),
//!         )
//!         .await?;
//!
//!     println!("{}", result.payload);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod scanner;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::ScanConfig;
pub use error::{CancelOrigin, ErrorKind, Result, ScanError};
pub use mcscan_client::CancellationToken;
pub use scanner::Scanner;
pub use scheduler::{
    BatchEntry, BatchEvent, BatchMode, BatchOptions, BatchOutcome, BatchScheduler, PollConfig,
    PollLoop, PollOutcome, PollState,
};
pub use service::{CancelAck, JobController};
