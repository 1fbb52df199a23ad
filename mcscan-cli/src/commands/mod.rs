//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod batch;
mod scan;

pub use scan::ScanCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use mcscan_core::{JobStatus, ScanState};
use mcscan_runner::{CancellationToken, PollOutcome, Scanner};
use tracing::warn;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Single scan management
    Scan {
        #[command(subcommand)]
        command: ScanCommands,
    },
    /// Scan several directories
    Batch {
        /// Directories to scan
        #[arg(required = true)]
        directories: Vec<String>,

        /// Scan one directory at a time
        #[arg(long)]
        sequential: bool,

        /// Scans running at once (concurrent mode)
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Rescan everything instead of only changed files
        #[arg(long)]
        full: bool,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let scanner = Scanner::from_config(config.scan.clone());

    match command {
        Commands::Scan { command } => scan::handle_scan_command(command, &scanner).await,
        Commands::Batch {
            directories,
            sequential,
            max_concurrency,
            full,
        } => batch::run_batch(&scanner, directories, sequential, max_concurrency, full).await,
    }
}

/// Token that fires on Ctrl-C
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            trigger.cancel();
        }
    });
    token
}

/// Print the final state of a followed scan
fn print_outcome(outcome: &PollOutcome) {
    match outcome {
        PollOutcome::Completed(result) => {
            println!("{} Scan {} completed", "✓".green(), result.job_id.cyan());
            print_json(&result.payload);
        }
        PollOutcome::Failed { job_id, error } => {
            println!("{} Scan {} failed [{}]", "✗".red(), job_id.cyan(), error.kind());
            println!("  {}", error.to_string().red());
        }
        PollOutcome::Cancelled { job_id, origin } => {
            println!("{} Scan {} cancelled {}", "■".yellow(), job_id.cyan(), origin);
        }
        PollOutcome::TimedOut { job_id, elapsed, .. } => {
            println!(
                "{} Stopped following scan {} after {}s; it may still be running",
                "⧗".yellow(),
                job_id.cyan(),
                elapsed.as_secs()
            );
        }
    }
}

/// One-line progress of a scan
fn print_progress(status: &JobStatus) {
    let mut line = format!(
        "  {} {:>5.1}%  {}/{}",
        colorize_state(status.status),
        status.progress,
        status.processed_items,
        status.total_items
    );
    if let Some(item) = &status.current_item {
        line.push_str(&format!("  {}", item.dimmed()));
    }
    println!("{}", line);
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => println!("{}", pretty),
        Err(_) => println!("{}", value),
    }
}

/// Colorize scan state for display
fn colorize_state(state: ScanState) -> ColoredString {
    let text = state.as_str();
    match state {
        ScanState::Pending => text.yellow(),
        ScanState::Running => text.cyan(),
        ScanState::Completed => text.green(),
        ScanState::Failed => text.red(),
        ScanState::Cancelled => text.dimmed(),
    }
}
