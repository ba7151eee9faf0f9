//! Submux - Batch MKV Subtitle Conversion
//!
//! This is the main entry point for the Submux application, which finds
//! MKV files with unconverted subtitle tracks, converts them via BDSup2Sub
//! and remuxes the results under a bounded concurrency ceiling.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use submux::cli::Args;
use submux::config::Config;
use submux::pipeline::SubtitlePipeline;
use submux::scanner::scan_directory;
use submux::scheduler::JobScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    info!("Starting Submux - Batch MKV Subtitle Conversion");

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let root = args.input_dir.canonicalize().map_err(|e| {
        anyhow::anyhow!("Invalid input directory {}: {}", args.input_dir.display(), e)
    })?;

    // Discover work before executing any of it
    let (units, clean) = scan_directory(&root, &config.scan);
    if !clean {
        warn!(
            "Some directories could not be enumerated, continuing with {} discovered files",
            units.len()
        );
    }
    info!("Found {} container files to process", units.len());

    let scheduler = JobScheduler::new(config.jobs.max_concurrency);
    let pipeline = Arc::new(SubtitlePipeline::new(config)?);
    let summary = scheduler.run_all(units, pipeline).await;

    // Individual unit failures are reported through the log only; the batch
    // itself still exits successfully.
    info!(
        "Batch finished: {} completed, {} skipped, {} failed",
        summary.completed, summary.skipped, summary.failed
    );

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let submux_dir = std::env::current_dir()?.join(".submux");
    let log_dir = submux_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "submux.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("submux.log").display()
    );

    Ok(())
}
