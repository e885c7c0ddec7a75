//! Listing walker - drives one ingestion pass over the latest-releases listing
//!
//! Pages are visited from the highest page number down to the first one, and
//! rows within a page bottom to top, so older releases are ingested before
//! newer ones. Every row hands its novel to the bootstrap step and its newest
//! chapter to the discovery engine.

use crate::config::{Config, CoverMode, SourceConfig};
use crate::crawler::bootstrap::NovelBootstrap;
use crate::crawler::discovery::{ChapterSighting, DiscoveryEngine};
use crate::crawler::extractor::{extract_listing_rows, ListingRow};
use crate::crawler::fetcher::Fetcher;
use crate::ids::{chapter_id_from_href, chapter_slug_from_href, novel_id_from_href};
use crate::storage::{AssetStore, ChapterStore, FsAssetStore, NovelStore, RunStats};
use crate::{CrawlerError, Result, StorageContext};
use std::time::Duration;

/// Walks the configured listing pages
pub struct ListingWalker {
    source: SourceConfig,
    fetcher: Fetcher,
    assets: Option<Box<dyn AssetStore>>,
    persist_delay: Duration,
    stats: RunStats,
}

impl ListingWalker {
    /// Creates a walker from the configuration
    ///
    /// In `directory` cover mode the asset directory is created here.
    pub fn new(config: &Config) -> Result<Self> {
        let fetcher = Fetcher::from_config(config)?;

        let assets: Option<Box<dyn AssetStore>> = match (&config.covers.mode, &config.covers.directory) {
            (CoverMode::Directory, Some(dir)) => Some(Box::new(
                FsAssetStore::new(dir).with_context(|| format!("opening cover directory {}", dir))?,
            )),
            (CoverMode::Directory, None) => {
                return Err(crate::ConfigError::Validation(
                    "covers.directory is required when covers.mode is \"directory\"".to_string(),
                )
                .into())
            }
            (CoverMode::Inline, _) => None,
        };

        Ok(Self {
            source: config.source.clone(),
            fetcher,
            assets,
            persist_delay: Duration::from_millis(config.crawler.persist_delay_ms),
            stats: RunStats::default(),
        })
    }

    /// Counters for the pages and rows processed so far
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Processes every listing page, stopping at the first fatal error
    pub async fn run<S>(&mut self, store: &mut S) -> Result<()>
    where
        S: NovelStore + ChapterStore,
    {
        let last = self.source.last_page()?;

        for page in (self.source.first_page..=last).rev() {
            let path = self.source.listing_path_for(page);
            tracing::info!("Processing listing page {} ({})", page, path);

            let listing = self.fetcher.fetch_page(&path).await?;
            let rows = extract_listing_rows(&listing.body)?;
            self.stats.pages += 1;

            if rows.is_empty() {
                tracing::warn!("Listing page {} has no rows", page);
                continue;
            }

            for row in rows.iter().rev() {
                self.stats.rows += 1;
                self.process_row(store, &listing.url, row).await?;
            }
        }

        tracing::info!(
            "Listing done: {} pages, {} rows ({} skipped), {} new novels, {} new chapters",
            self.stats.pages,
            self.stats.rows,
            self.stats.skipped_rows,
            self.stats.novels_created,
            self.stats.chapters_added
        );

        Ok(())
    }

    /// Bootstraps the row's novel and runs discovery from its newest chapter
    async fn process_row<S>(&mut self, store: &mut S, page: &str, row: &ListingRow) -> Result<()>
    where
        S: NovelStore + ChapterStore,
    {
        let novel_href = row
            .novel_href
            .as_deref()
            .ok_or_else(|| CrawlerError::MissingReference {
                field: "novel",
                page: page.to_string(),
            })?;
        let chapter_href = row
            .chapter_href
            .as_deref()
            .ok_or_else(|| CrawlerError::MissingReference {
                field: "chapter",
                page: page.to_string(),
            })?;

        let (novel_id, chapter_id) = match row_identifiers(novel_href, chapter_href) {
            Ok(ids) => ids,
            Err(CrawlerError::UnparseableIdentifier { href }) => {
                tracing::warn!(
                    "Skipping row on {}: no identifier in {} ({})",
                    page,
                    href,
                    chapter_slug_from_href(&href).unwrap_or_default()
                );
                self.stats.skipped_rows += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        tracing::debug!("Row: novel {} chapter {}", novel_id, chapter_id);

        let bootstrap = NovelBootstrap::new(&self.fetcher, self.assets.as_deref())
            .load_or_create(&*store, &novel_id, novel_href)
            .await?;
        if bootstrap.created {
            self.stats.novels_created += 1;
        }
        let mut novel = bootstrap.novel;

        let head = ChapterSighting {
            chapter_id,
            chapter_title: row.chapter_title.clone(),
            chapter_href: chapter_href.to_string(),
        };
        let outcome = DiscoveryEngine::new(&self.fetcher, self.persist_delay)
            .discover(store, &mut novel, &head)
            .await?;
        self.stats.chapters_added += outcome.fetched as u32;

        Ok(())
    }
}

/// Novel and chapter ids of a listing row
fn row_identifiers(novel_href: &str, chapter_href: &str) -> Result<(String, String)> {
    let chapter_id =
        chapter_id_from_href(chapter_href).ok_or_else(|| CrawlerError::UnparseableIdentifier {
            href: chapter_href.to_string(),
        })?;
    let novel_id =
        novel_id_from_href(novel_href).ok_or_else(|| CrawlerError::UnparseableIdentifier {
            href: novel_href.to_string(),
        })?;
    Ok((novel_id, chapter_id))
}
