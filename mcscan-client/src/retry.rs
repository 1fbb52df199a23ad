//! Retry policy

use std::time::Duration;

/// Bounded exponential backoff
///
/// A plain value: the client reads it on every request and keeps no retry
/// state of its own, so the same policy can be shared and tested in
/// isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Additional attempts after the first one
    pub max_retries: u32,
}

impl RetryPolicy {
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    pub fn new(base_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_retries,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-indexed)
    ///
    /// `min(base_delay * 2^(attempt - 1), max_delay)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Whether retry number `attempt` (1-indexed) is within budget
    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_BASE_DELAY,
            Self::DEFAULT_MAX_DELAY,
            Self::DEFAULT_MAX_RETRIES,
        )
    }
}
