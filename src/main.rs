//! dirmill - Parallel File Scanner with a Bounded Job Queue
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use dirmill::config::{CliArgs, Command, RunConfig, ScanMode};
use dirmill::coordinator::ScanCoordinator;
use dirmill::histogram::{HistogramAccumulator, HistogramProcessor};
use dirmill::progress::{
    print_final_histogram, print_header, print_search_total, print_summary, HistogramView,
};
use dirmill::search::{MatchSink, SearchProcessor};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    let verbose = match &args.command {
        Command::Search { scan, .. } | Command::Histogram { scan, .. } => scan.verbose,
    };
    setup_logging(verbose)?;

    // Validate and create config
    let config = RunConfig::from_args(args).context("Invalid configuration")?;

    // Print header
    if !config.quiet {
        let mode = match &config.mode {
            ScanMode::Search { .. } => "search",
            ScanMode::Histogram => "histogram",
        };
        let paths = config
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_header(mode, &paths, config.worker_count, config.queue_capacity);
    }

    // Run the selected scan mode
    match config.mode.clone() {
        ScanMode::Search { needle } => run_search(config, &needle),
        ScanMode::Histogram => run_histogram(config),
    }
}

/// Run a substring search scan with grep-style output
fn run_search(config: RunConfig, needle: &str) -> Result<()> {
    let quiet = config.quiet;
    let coordinator = ScanCoordinator::new(config);

    // Setup signal handler for graceful shutdown
    let interrupt = coordinator.interrupt_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, finishing queued jobs...");
        interrupt.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let sink = Arc::new(MatchSink::stdout());
    let processor = Arc::new(SearchProcessor::new(needle, Arc::clone(&sink)));

    // Run the scan
    let report = coordinator.run(processor).context("Scan failed")?;

    sink.flush().context("Failed to flush matched lines")?;

    // Print summary
    if !quiet {
        print_search_total(sink.match_count());
        print_summary(&report);
    }

    // Report success/failure
    if !report.completed {
        info!("Scan was interrupted before completion");
    }

    if report.process_failures > 0 || report.walk_errors > 0 {
        info!(
            process_failures = report.process_failures,
            walk_errors = report.walk_errors,
            "Scan completed with errors"
        );
    }

    Ok(())
}

/// Run a bit-histogram scan with a live display
fn run_histogram(config: RunConfig) -> Result<()> {
    let quiet = config.quiet;
    let coordinator = ScanCoordinator::new(config);

    // Setup signal handler for graceful shutdown
    let interrupt = coordinator.interrupt_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, finishing queued jobs...");
        interrupt.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let accumulator = Arc::new(HistogramAccumulator::new());

    // Live display only when stderr is a terminal
    let view = if !quiet && console::Term::stderr().is_term() {
        Some(Arc::new(HistogramView::new()))
    } else {
        None
    };

    let processor = Arc::new(HistogramProcessor::new(
        Arc::clone(&accumulator),
        view.clone(),
    ));

    // Run the scan
    let report = coordinator.run(processor).context("Scan failed")?;

    // The final histogram replaces the live display
    if let Some(view) = view {
        view.finish_and_clear();
    }
    print_final_histogram(&accumulator.snapshot());

    // Print summary
    if !quiet {
        print_summary(&report);
    }

    // Report success/failure
    if !report.completed {
        info!("Scan was interrupted before completion");
    }

    if report.process_failures > 0 || report.walk_errors > 0 {
        info!(
            process_failures = report.process_failures,
            walk_errors = report.walk_errors,
            "Scan completed with errors"
        );
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("dirmill=debug,warn")
    } else {
        EnvFilter::new("dirmill=info,warn")
    };

    // Logs go to stderr so search matches on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
