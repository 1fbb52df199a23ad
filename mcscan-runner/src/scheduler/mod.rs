//! Scheduler layer
//!
//! Drives started scans to a terminal state. [`PollLoop`] follows a single
//! scan; [`BatchScheduler`] runs many of them sequentially or in bounded
//! chunks on top of it.

pub mod batch;
pub mod events;
pub mod poller;

pub use batch::{BatchEntry, BatchMode, BatchOptions, BatchOutcome, BatchScheduler};
pub use events::BatchEvent;
pub use poller::{PollConfig, PollLoop, PollOutcome, PollState};
