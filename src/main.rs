//! Novel-Ripple main entry point
//!
//! This is the command-line interface for the Novel-Ripple chapter ingester.

use anyhow::Context;
use clap::Parser;
use novel_ripple::config::{load_config_with_hash, Config, CoverMode};
use novel_ripple::crawler::{backfill_prev_chapter_ids, run_ingest};
use novel_ripple::output::{load_statistics, print_statistics};
use novel_ripple::storage::open_storage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Novel-Ripple: an incremental novel chapter ingester
///
/// Novel-Ripple walks a site's latest-releases listing and follows each
/// novel's chapter chain backwards until it meets chapters it already has,
/// numbering the new ones so every novel reads 1..N.
#[derive(Parser, Debug)]
#[command(name = "novel-ripple")]
#[command(version = "1.0.0")]
#[command(about = "An incremental novel chapter ingester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be walked without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "backfill_prev_ids"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "backfill_prev_ids"])]
    stats: bool,

    /// Recompute stored previous-chapter ids from their hrefs and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    backfill_prev_ids: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.backfill_prev_ids {
        handle_backfill(&config).await?;
    } else {
        handle_ingest(&config, &config_hash).await;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("novel_ripple=info,warn"),
            1 => EnvFilter::new("novel_ripple=debug,info"),
            2 => EnvFilter::new("novel_ripple=trace,debug"),
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

/// Handles the --dry-run mode: shows the pages a run would walk
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Novel-Ripple Dry Run ===\n");

    let source = &config.source;
    println!("Source:");
    println!("  Base URL: {}", source.base_url);
    println!("  Request timeout: {}ms", source.request_timeout_ms);
    println!(
        "  Listing pages ({}), walked in this order:",
        source.page_count
    );
    let last = source.last_page()?;
    for page in (source.first_page..=last).rev() {
        println!("    * {}", source.listing_path_for(page));
    }

    println!("\nCrawler:");
    println!("  Persist delay: {}ms", config.crawler.persist_delay_ms);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);
    match (config.covers.mode, &config.covers.directory) {
        (CoverMode::Directory, Some(dir)) => println!("  Covers: directory {}", dir),
        _ => println!("  Covers: inline"),
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.storage.database_path);
    println!("Database: {}\n", path.display());

    let storage =
        open_storage(path).with_context(|| format!("opening database {}", path.display()))?;
    let stats = load_statistics(&storage).context("loading statistics")?;
    storage.close().context("closing database")?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the --backfill-prev-ids mode
async fn handle_backfill(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.storage.database_path);
    let mut storage =
        open_storage(path).with_context(|| format!("opening database {}", path.display()))?;

    let delay = Duration::from_millis(config.crawler.persist_delay_ms);
    let outcome = backfill_prev_chapter_ids(&mut storage, delay).await;
    storage.close().context("closing database")?;

    let report = outcome.context("backfilling previous-chapter ids")?;
    println!(
        "✓ Updated {} of {} chapters",
        report.updated, report.scanned
    );

    Ok(())
}

/// Handles the main ingestion run
///
/// A failed run is logged, not returned: the next run resumes from whatever
/// was stored.
async fn handle_ingest(config: &Config, config_hash: &str) {
    tracing::info!(
        "Walking {} listing pages of {}",
        config.source.page_count,
        config.source.base_url
    );

    match run_ingest(config, config_hash).await {
        Ok(stats) => tracing::info!(
            "Ingestion completed: {} new novels, {} new chapters",
            stats.novels_created,
            stats.chapters_added
        ),
        Err(e) => tracing::error!("Ingestion failed: {}", e),
    }
}
