//! Crawler module for chapter ingestion
//!
//! This module contains the ingestion logic, including:
//! - HTTP fetching against the configured site
//! - HTML extraction for listing, novel and chapter pages
//! - First-sighting novel bootstrap
//! - Backward chapter discovery with two-phase numbering
//! - The listing walk that ties them together

mod backfill;
mod bootstrap;
mod discovery;
mod extractor;
mod fetcher;
mod walker;

pub use backfill::{backfill_prev_chapter_ids, BackfillReport};
pub use bootstrap::{BootstrapOutcome, NovelBootstrap};
pub use discovery::{ChapterSighting, DiscoveryEngine, DiscoveryOutcome};
pub use extractor::{
    extract_chapter_detail, extract_listing_rows, extract_novel_detail, ChapterDetail,
    ListingRow, NovelDetail,
};
pub use fetcher::{build_http_client, FetchedBinary, FetchedPage, Fetcher};
pub use walker::ListingWalker;

use crate::config::Config;
use crate::storage::{open_storage, ChapterStore, NovelStore, RunStats, RunStatus, RunStore};
use crate::{Result, StorageContext};
use std::path::Path;
use std::time::Instant;

/// Runs a complete ingestion against the configured database
///
/// The store is opened once and closed once, whether or not the run succeeds.
///
/// # Example
///
/// ```no_run
/// use novel_ripple::config::load_config_with_hash;
/// use novel_ripple::crawler::run_ingest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let stats = run_ingest(&config, &hash).await?;
/// println!("{} new chapters", stats.chapters_added);
/// # Ok(())
/// # }
/// ```
pub async fn run_ingest(config: &Config, config_hash: &str) -> Result<RunStats> {
    let path = Path::new(&config.storage.database_path);
    let mut storage =
        open_storage(path).with_context(|| format!("opening {}", path.display()))?;

    let outcome = ingest_into(config, config_hash, &mut storage).await;

    let closed = storage
        .close()
        .with_context(|| format!("closing {}", path.display()));
    match (outcome, closed) {
        (Ok(stats), Ok(())) => Ok(stats),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            tracing::error!("{}", close_err);
            Err(e)
        }
    }
}

/// Runs one ingestion pass against an already opened store
///
/// The pass is recorded as a run: `Completed` with its counters on success,
/// `Failed` with the counters reached so far otherwise.
pub async fn ingest_into<S>(config: &Config, config_hash: &str, storage: &mut S) -> Result<RunStats>
where
    S: NovelStore + ChapterStore + RunStore,
{
    let mut walker = ListingWalker::new(config)?;

    let run_id = storage
        .create_run(config_hash)
        .with_context(|| "creating run".to_string())?;
    tracing::info!("Starting ingestion run {}", run_id);
    let started = Instant::now();

    let result = walker.run(storage).await;
    let stats = walker.stats();

    let status = if result.is_ok() {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };
    let finished = storage
        .finish_run(run_id, status, &stats)
        .with_context(|| format!("finishing run {}", run_id));

    match (result, finished) {
        (Ok(()), Ok(())) => {
            tracing::info!(
                "Run {} completed in {:?}: {} new chapters",
                run_id,
                started.elapsed(),
                stats.chapters_added
            );
            Ok(stats)
        }
        (Ok(()), Err(e)) => Err(e),
        (Err(e), finished) => {
            if let Err(finish_err) = finished {
                tracing::error!("{}", finish_err);
            }
            Err(e)
        }
    }
}
