//! Scan configuration
//!
//! Defines all configurable parameters of the orchestration layer: backend
//! connection, per-request timeouts and retry budget, polling cadence and
//! batch concurrency.

use mcscan_client::RetryPolicy;
use std::time::Duration;

use crate::scheduler::PollConfig;

/// Orchestration configuration
///
/// All timeouts and intervals are configurable to allow tuning for
/// different deployments (local backend vs. remote worker, fast vs. slow
/// disks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Backend API base URL (e.g., "http://localhost:18000/api/v1")
    pub backend_url: String,

    /// Timeout for start, results and cancel requests
    pub request_timeout: Duration,

    /// Timeout for status requests; kept short so a poll tick never stalls
    pub status_timeout: Duration,

    /// Retries after the first attempt of a transiently failing request
    pub max_retries: u32,

    /// Delay before the first retry
    pub retry_base_delay: Duration,

    /// Upper bound for any retry delay
    pub retry_max_delay: Duration,

    /// How often to poll a running scan
    pub poll_interval: Duration,

    /// How long to poll a scan before giving up on it
    pub poll_timeout: Duration,

    /// Scans started together in concurrent batch mode
    pub max_concurrency: usize,
}

impl ScanConfig {
    pub const DEFAULT_BACKEND_URL: &'static str = "http://localhost:18000/api/v1";

    /// Creates a new configuration with defaults
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            request_timeout: Duration::from_secs(30),
            status_timeout: Duration::from_secs(5),
            max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
            retry_base_delay: RetryPolicy::DEFAULT_BASE_DELAY,
            retry_max_delay: RetryPolicy::DEFAULT_MAX_DELAY,
            poll_interval: Duration::from_millis(1_000),
            poll_timeout: Duration::from_millis(300_000),
            max_concurrency: 3,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognised environment variables (all optional):
    /// - MCSCAN_BACKEND_URL (default: http://localhost:18000/api/v1)
    /// - MCSCAN_REQUEST_TIMEOUT_MS (default: 30000)
    /// - MCSCAN_STATUS_TIMEOUT_MS (default: 5000)
    /// - MCSCAN_MAX_RETRIES (default: 3)
    /// - MCSCAN_RETRY_BASE_DELAY_MS (default: 1000)
    /// - MCSCAN_RETRY_MAX_DELAY_MS (default: 10000)
    /// - MCSCAN_POLL_INTERVAL_MS (default: 1000)
    /// - MCSCAN_POLL_TIMEOUT_MS (default: 300000)
    /// - MCSCAN_MAX_CONCURRENCY (default: 3)
    ///
    /// Values that fail to parse fall back to their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ScanConfig::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new(
            lookup("MCSCAN_BACKEND_URL").unwrap_or_else(|| Self::DEFAULT_BACKEND_URL.to_string()),
        );

        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        let max_retries = lookup("MCSCAN_MAX_RETRIES")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(defaults.max_retries);

        let max_concurrency = lookup("MCSCAN_MAX_CONCURRENCY")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_concurrency);

        Self {
            request_timeout: millis("MCSCAN_REQUEST_TIMEOUT_MS", defaults.request_timeout),
            status_timeout: millis("MCSCAN_STATUS_TIMEOUT_MS", defaults.status_timeout),
            retry_base_delay: millis("MCSCAN_RETRY_BASE_DELAY_MS", defaults.retry_base_delay),
            retry_max_delay: millis("MCSCAN_RETRY_MAX_DELAY_MS", defaults.retry_max_delay),
            poll_interval: millis("MCSCAN_POLL_INTERVAL_MS", defaults.poll_interval),
            poll_timeout: millis("MCSCAN_POLL_TIMEOUT_MS", defaults.poll_timeout),
            max_retries,
            max_concurrency,
            ..defaults
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.max_retries = policy.max_retries;
        self.retry_base_delay = policy.base_delay;
        self.retry_max_delay = policy.max_delay;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_base_delay, self.retry_max_delay, self.max_retries)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: self.poll_interval,
            timeout: self.poll_timeout,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend_url.is_empty() {
            anyhow::bail!("backend_url cannot be empty");
        }

        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            anyhow::bail!("backend_url must start with http:// or https://");
        }

        if self.request_timeout.is_zero() || self.status_timeout.is_zero() {
            anyhow::bail!("request timeouts must be greater than 0");
        }

        if self.retry_base_delay > self.retry_max_delay {
            anyhow::bail!("retry_base_delay cannot exceed retry_max_delay");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.poll_timeout < self.poll_interval {
            anyhow::bail!("poll_timeout must be at least one poll_interval");
        }

        if self.max_concurrency == 0 {
            anyhow::bail!("max_concurrency must be greater than 0");
        }

        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BACKEND_URL)
    }
}
