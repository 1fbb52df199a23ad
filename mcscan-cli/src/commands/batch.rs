//! Batch command handler
//!
//! Scans several directories and reports each scan as it progresses.

use anyhow::{Result, bail};
use colored::*;
use mcscan_core::JobRequest;
use mcscan_runner::{BatchEvent, BatchMode, BatchOptions, Scanner};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use super::{colorize_state, interrupt_token};

/// Run a batch of scans
pub async fn run_batch(
    scanner: &Scanner,
    directories: Vec<String>,
    sequential: bool,
    max_concurrency: Option<usize>,
    full: bool,
) -> Result<()> {
    let requests: Vec<JobRequest> = directories
        .into_iter()
        .map(|directory| {
            let request = JobRequest::new(directory);
            if full { request.full() } else { request }
        })
        .collect();
    let mode = if sequential {
        BatchMode::Sequential
    } else {
        BatchMode::Concurrent
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(rx, requests.clone()));

    let mut options = BatchOptions::default()
        .with_cancel(&interrupt_token())
        .with_events(tx);
    options.max_concurrency = max_concurrency;

    println!(
        "{}",
        format!("Scanning {} director(ies):", requests.len()).bold()
    );
    let outcome = scanner.run_batch(&requests, mode, options).await;
    // the sender is dropped with the options, so the printer drains and ends
    join_printer(printer).await;

    let succeeded = outcome.successes().count();
    let failed = outcome.len() - succeeded;
    println!();
    if failed == 0 {
        println!("{}", format!("✓ All {} scan(s) completed", succeeded).green());
        return Ok(());
    }

    println!(
        "{}",
        format!("✗ {} of {} scan(s) did not complete", failed, outcome.len()).red()
    );
    for (index, error) in outcome.failures() {
        println!(
            "  {} {} [{}] {}",
            "▸".red(),
            requests[index].directory,
            error.kind(),
            error.to_string().dimmed()
        );
    }
    bail!("{} of {} scans failed", failed, outcome.len())
}

/// Waits for the progress printer; reports whether it ran to the end
async fn join_printer(printer: JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Progress printer stopped early: {}", e);
            false
        }
    }
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<BatchEvent>, requests: Vec<JobRequest>) {
    while let Some(event) = rx.recv().await {
        let directory = requests
            .get(event.index())
            .map(|request| request.directory.as_str())
            .unwrap_or_default();

        match event {
            BatchEvent::Started { job_id, .. } => {
                println!("  {} {} started as {}", "▸".cyan(), directory, job_id.dimmed());
            }
            BatchEvent::Progress { status, .. } => {
                println!(
                    "  {} {} {} {:.1}%",
                    "·".dimmed(),
                    directory,
                    colorize_state(status.status),
                    status.progress
                );
            }
            BatchEvent::Completed { .. } => {
                println!("  {} {} completed", "✓".green(), directory);
            }
            BatchEvent::Failed { kind, message, .. } => {
                println!("  {} {} [{}] {}", "✗".red(), directory, kind, message.red());
            }
        }
    }
}
