//! Configuration module
//!
//! Builds the scan configuration from the environment and command-line
//! overrides.

use anyhow::{Context, Result};
use mcscan_runner::ScanConfig;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings handed to the scanner
    pub scan: ScanConfig,
}

impl Config {
    /// Environment defaults with command-line flags applied on top
    pub fn load(
        backend_url: String,
        poll_interval_ms: Option<u64>,
        poll_timeout_ms: Option<u64>,
    ) -> Result<Self> {
        Self::with_overrides(
            ScanConfig::from_env(),
            backend_url,
            poll_interval_ms,
            poll_timeout_ms,
        )
    }

    /// Applies command-line flags to `scan` and validates the result
    pub fn with_overrides(
        mut scan: ScanConfig,
        backend_url: String,
        poll_interval_ms: Option<u64>,
        poll_timeout_ms: Option<u64>,
    ) -> Result<Self> {
        scan.backend_url = backend_url;
        if let Some(ms) = poll_interval_ms {
            scan.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = poll_timeout_ms {
            scan.poll_timeout = Duration::from_millis(ms);
        }

        scan.validate().context("Invalid scan configuration")?;
        Ok(Self { scan })
    }
}
