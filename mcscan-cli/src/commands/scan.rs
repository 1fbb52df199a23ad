//! Scan command handlers
//!
//! Handles starting, inspecting, following and cancelling single scans.

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use mcscan_core::dto::job::extract_job_id;
use mcscan_core::{JobHandle, JobRequest, JobStatus};
use mcscan_runner::{CancellationToken, PollOutcome, Scanner};

use super::{colorize_state, interrupt_token, print_json, print_outcome, print_progress};

/// Scan subcommands
#[derive(Subcommand)]
pub enum ScanCommands {
    /// Start a scan and print its id
    Start {
        /// Directory to scan
        directory: String,

        /// Rescan everything instead of only changed files
        #[arg(long)]
        full: bool,

        /// Project the scan belongs to
        #[arg(long)]
        project: Option<String>,
    },
    /// Show the current status of a scan
    Status {
        /// Scan ID
        id: String,
    },
    /// Follow a started scan until it settles
    Watch {
        /// Scan ID
        id: String,
    },
    /// Print the results of a completed scan
    Results {
        /// Scan ID
        id: String,
    },
    /// Cancel a scan
    Cancel {
        /// Scan ID
        id: String,
    },
    /// List scans the backend is running
    Active,
    /// Start a scan and follow it until it settles
    Run {
        /// Directory to scan
        directory: String,

        /// Rescan everything instead of only changed files
        #[arg(long)]
        full: bool,

        /// Project the scan belongs to
        #[arg(long)]
        project: Option<String>,
    },
}

/// Handle scan commands
///
/// Routes scan subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The scan command to execute
/// * `scanner` - Scanner wired from the CLI configuration
pub async fn handle_scan_command(command: ScanCommands, scanner: &Scanner) -> Result<()> {
    match command {
        ScanCommands::Start {
            directory,
            full,
            project,
        } => start_scan(scanner, job_request(directory, full, project)).await,
        ScanCommands::Status { id } => show_status(scanner, &id).await,
        ScanCommands::Watch { id } => watch_scan(scanner, JobHandle::new(id)).await,
        ScanCommands::Results { id } => show_results(scanner, &id).await,
        ScanCommands::Cancel { id } => cancel_scan(scanner, &id).await,
        ScanCommands::Active => list_active(scanner).await,
        ScanCommands::Run {
            directory,
            full,
            project,
        } => run_scan(scanner, job_request(directory, full, project)).await,
    }
}

fn job_request(directory: String, full: bool, project: Option<String>) -> JobRequest {
    let mut request = JobRequest::new(directory);
    if full {
        request = request.full();
    }
    if let Some(project) = project {
        request = request.with_project(project);
    }
    request
}

/// Start a scan
async fn start_scan(scanner: &Scanner, request: JobRequest) -> Result<()> {
    let handle = scanner
        .start_scan(&request, &CancellationToken::new())
        .await?;

    println!("{}", "✓ Scan started".green());
    println!("  ID:        {}", handle.job_id.cyan());
    println!("  Directory: {}", request.directory);
    println!(
        "  Mode:      {}",
        if request.incremental { "incremental" } else { "full" }
    );

    Ok(())
}

/// Get and display a scan's status
async fn show_status(scanner: &Scanner, id: &str) -> Result<()> {
    let status = scanner.scan_status(id).await?;
    print_status_details(&status);
    Ok(())
}

/// Follow a started scan
async fn watch_scan(scanner: &Scanner, handle: JobHandle) -> Result<()> {
    println!("{}", format!("Following scan {}:", handle.job_id).bold());
    let outcome = scanner
        .poll_status(handle, &interrupt_token(), print_progress)
        .await;
    finish(outcome)
}

/// Start a scan and follow it
async fn run_scan(scanner: &Scanner, request: JobRequest) -> Result<()> {
    let cancel = interrupt_token();
    let handle = scanner.start_scan(&request, &cancel).await?;

    println!(
        "{}",
        format!("Scanning {} (scan {}):", request.directory, handle.job_id).bold()
    );
    let outcome = scanner.poll_status(handle, &cancel, print_progress).await;
    finish(outcome)
}

fn finish(outcome: PollOutcome) -> Result<()> {
    print_outcome(&outcome);
    match outcome {
        PollOutcome::Completed(_) => Ok(()),
        other => bail!("scan {} ended {}", other.job_id(), other.state()),
    }
}

/// Print a completed scan's results
async fn show_results(scanner: &Scanner, id: &str) -> Result<()> {
    let result = scanner.scan_results(id).await?;
    print_json(&result.payload);
    Ok(())
}

/// Cancel a scan
async fn cancel_scan(scanner: &Scanner, id: &str) -> Result<()> {
    let ack = scanner.cancel_scan(id).await?;

    if ack.already_terminal {
        println!(
            "{}",
            format!("Scan {} already {}, nothing to cancel", ack.job_id, ack.status).yellow()
        );
    } else {
        println!("{}", format!("✓ Cancel requested for scan {}", ack.job_id).green());
        println!("  Status: {}", colorize_state(ack.status));
    }

    Ok(())
}

/// List active scans
async fn list_active(scanner: &Scanner) -> Result<()> {
    let active = scanner.active_scans().await?;

    if active.active_scans.is_empty() {
        println!("{}", "No active scans.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} active scan(s):", active.total).bold());
    println!();
    for scan in &active.active_scans {
        let id = extract_job_id(scan).unwrap_or_else(|| "?".to_string());
        let directory = scan
            .get("directory")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        println!("  {} Scan {} {}", "▸".cyan(), id.cyan(), directory.dimmed());
    }

    Ok(())
}

/// Print detailed scan status
fn print_status_details(status: &JobStatus) {
    println!("{}", "Scan Details:".bold());
    println!("  ID:        {}", status.job_id.cyan());
    println!("  Status:    {}", colorize_state(status.status));
    println!("  Progress:  {:.1}%", status.progress);
    println!(
        "  Items:     {}/{}",
        status.processed_items, status.total_items
    );

    if let Some(item) = &status.current_item {
        println!("  Current:   {}", item.dimmed());
    }

    if let Some(started) = status.started_at {
        println!("  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(completed) = status.completed_at {
        println!("  Completed: {}", completed.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = status.started_at {
            let duration = completed.signed_duration_since(started);
            println!("  Duration:  {}s", duration.num_seconds());
        }
    }

    if let Some(error) = &status.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}
