//! Talkscan main entry point
//!
//! This is the command-line interface for the Talkscan announcement scanner.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use talkscan::config::{load_config_with_overrides, Config, ConfigOverrides};
use talkscan::crawler::crawl;
use talkscan::output::{build_report, print_crawl_stats, print_report, write_report};
use talkscan::storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Talkscan: a forum announcement scanner
///
/// Talkscan scans the newest topics of a forum section, asks a local LLM to
/// assess each announcement, and keeps a weighted score per topic in SQLite.
#[derive(Parser, Debug)]
#[command(name = "talkscan")]
#[command(version)]
#[command(about = "Scans forum announcements and scores them", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Forum section to scan (overrides forum.section-id)
    #[arg(long, value_name = "ID")]
    section: Option<u32>,

    /// Number of listing pages to scan (overrides forum.pages)
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Concurrent item workers (overrides crawler.workers)
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// Skip the crawl and only regenerate the report from the database
    #[arg(long)]
    report_only: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let overrides = ConfigOverrides {
        section_id: cli.section,
        pages: cli.pages,
        workers: cli.workers,
    };
    let (config, config_hash) = load_config_with_overrides(&cli.config, &overrides)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open database {}", config.output.database_path))?;
    let storage = Arc::new(Mutex::new(storage));

    if cli.report_only {
        tracing::info!("Report-only mode, skipping crawl");
    } else {
        handle_crawl(&config, storage.clone()).await?;
    }

    handle_report(&config, &storage)?;

    if let Ok(storage) = Arc::try_unwrap(storage) {
        let storage = storage
            .into_inner()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        storage.close().context("failed to close database")?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("talkscan=info,warn"),
            1 => EnvFilter::new("talkscan=debug,info"),
            2 => EnvFilter::new("talkscan=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the main crawl operation
///
/// Ctrl-C cancels the scan; items already stored stay stored.
async fn handle_crawl(config: &Config, storage: Arc<Mutex<SqliteStorage>>) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current items");
            watcher.cancel();
        }
    });

    tracing::info!(
        "Scanning {} (section {}, {} pages)",
        config.forum.base_url,
        config.forum.section_id,
        config.forum.pages
    );

    let stats = crawl(config, storage, &cancel)
        .await
        .context("crawl failed")?;

    if stats.cancelled > 0 || cancel.is_cancelled() {
        tracing::warn!("Crawl interrupted; unfinished topics will be picked up next run");
    }

    print_crawl_stats(&stats);
    Ok(())
}

/// Builds the report from the database and writes it to the report path
fn handle_report(config: &Config, storage: &Arc<Mutex<SqliteStorage>>) -> anyhow::Result<()> {
    let report = {
        let storage = storage
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        build_report(&*storage).context("failed to build report")?
    };

    let path = Path::new(&config.output.report_path);
    write_report(&report, path)
        .with_context(|| format!("failed to write report to {}", path.display()))?;

    print_report(&report);
    println!("\nReport saved: {}", path.display());
    println!("Database: {}", config.output.database_path);

    Ok(())
}
