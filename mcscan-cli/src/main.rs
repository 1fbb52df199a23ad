//! mcscan CLI
//!
//! Command-line interface for running scans on the mcscan backend.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use mcscan_runner::ScanConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mcscan")]
#[command(about = "Remote mod scan orchestration CLI", long_about = None)]
struct Cli {
    /// Scan backend URL
    #[arg(
        long,
        global = true,
        env = "MCSCAN_BACKEND_URL",
        default_value = ScanConfig::DEFAULT_BACKEND_URL
    )]
    backend_url: String,

    /// Time between two status checks of a running scan
    #[arg(long, global = true, env = "MCSCAN_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// How long to follow a scan before giving up on it
    #[arg(long, global = true, env = "MCSCAN_POLL_TIMEOUT_MS")]
    poll_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcscan=info,mcscan_runner=info,mcscan_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.backend_url, cli.poll_interval_ms, cli.poll_timeout_ms)?;

    handle_command(cli.command, &config).await
}
