//! Incremental chapter discovery and numbering
//!
//! The source only links each chapter to its predecessor, so new chapters are
//! found by walking backwards from the newest one a listing shows. A discovery
//! run works in two phases:
//!
//! 1. **Collect**: follow previous-chapter links from the head, storing every
//!    chapter not yet in the store with an unassigned number, until the walk
//!    meets an already-numbered chapter (the dedup boundary), a chapter with
//!    no predecessor, or a link whose id cannot be parsed.
//! 2. **Number**: anchor on the number of the chapter just before the oldest
//!    collected one (or 0 at the start of the novel) and number the collected
//!    chapters oldest first. Chapters that already hold a number are skipped.
//!
//! Chapters left unassigned by an aborted run are not a boundary: the walk
//! reuses their stored record without refetching and numbers them with the rest.

use crate::crawler::extractor::extract_chapter_detail;
use crate::crawler::fetcher::Fetcher;
use crate::ids::{chapter_id_from_href, chapter_slug_from_href};
use crate::model::{Chapter, ChapterNumber, Novel};
use crate::storage::{ChapterStore, NovelStore, StorageError};
use crate::{Result, StorageContext};
use std::collections::HashSet;
use std::time::Duration;

/// The newest chapter of a novel as observed on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSighting {
    pub chapter_id: String,
    pub chapter_title: String,
    pub chapter_href: String,
}

/// What one discovery run changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    /// Chapters fetched and stored by this run
    pub fetched: usize,
    /// Unnumbered chapters from an earlier aborted run picked up again
    pub resumed: usize,
    /// Chapters that received their number
    pub numbered: usize,
    /// Whether the novel's latest-chapter pointer moved
    pub latest_updated: bool,
}

/// Walks chapter chains for one novel at a time
pub struct DiscoveryEngine<'a> {
    fetcher: &'a Fetcher,
    /// Pause between numbering writes
    persist_delay: Duration,
}

impl<'a> DiscoveryEngine<'a> {
    pub fn new(fetcher: &'a Fetcher, persist_delay: Duration) -> Self {
        Self {
            fetcher,
            persist_delay,
        }
    }

    /// Ingests every chapter between `head` and the stored chapters of `novel`
    ///
    /// On success the chapters are numbered and the novel's latest pointer
    /// reflects `head` when it is newer than the stored one. A fetch or store
    /// failure aborts the run; chapters stored so far keep their unassigned
    /// number and are resumed by the next run.
    pub async fn discover<S>(
        &self,
        store: &mut S,
        novel: &mut Novel,
        head: &ChapterSighting,
    ) -> Result<DiscoveryOutcome>
    where
        S: NovelStore + ChapterStore,
    {
        let mut outcome = DiscoveryOutcome::default();

        let collected = self.collect(store, novel, head, &mut outcome).await?;

        if collected.is_empty() {
            tracing::debug!("Novel {} is up to date at chapter {}", novel.novel_id, head.chapter_id);
        } else {
            tracing::info!(
                "Loaded {} chapters for novel {} ({} fetched, {} resumed)",
                collected.len(),
                novel.novel_id,
                outcome.fetched,
                outcome.resumed
            );
            outcome.numbered = self.assign_numbers(store, &novel.novel_id, &collected).await?;
        }

        if should_advance_latest(store, novel, head)? {
            novel.set_last_chapter(&head.chapter_id, &head.chapter_title);
            store
                .put_novel(novel)
                .with_context(|| format!("saving novel {}", novel.novel_id))?;
            outcome.latest_updated = true;
            tracing::info!(
                "Novel {} latest chapter is now {} ({})",
                novel.novel_id,
                head.chapter_id,
                head.chapter_title
            );
        }

        Ok(outcome)
    }

    /// Phase 1: walks back from the head, returning collected ids newest first
    async fn collect<S: ChapterStore>(
        &self,
        store: &mut S,
        novel: &Novel,
        head: &ChapterSighting,
        outcome: &mut DiscoveryOutcome,
    ) -> Result<Vec<String>> {
        let novel_id = novel.novel_id.as_str();
        let known = store
            .known_chapters(novel_id)
            .with_context(|| format!("listing chapters of novel {}", novel_id))?;

        let mut collected: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        let mut current_id = head.chapter_id.clone();
        let mut current_href = head.chapter_href.clone();

        loop {
            let prev_href = match known.get(&current_id) {
                Some(ChapterNumber::Assigned(number)) => {
                    tracing::debug!(
                        "Stopping at stored chapter {} (#{}) of novel {}",
                        current_id,
                        number,
                        novel_id
                    );
                    break;
                }
                Some(ChapterNumber::Unassigned) => {
                    let stored = store
                        .get_chapter(novel_id, &current_id)
                        .with_context(|| chapter_context(novel_id, &current_id))?;
                    match stored {
                        Some(chapter) => {
                            tracing::debug!("Resuming unnumbered chapter {} of novel {}", current_id, novel_id);
                            outcome.resumed += 1;
                            chapter.prev_chapter_href
                        }
                        None => self.fetch_chapter(store, novel_id, &current_id, &current_href, outcome).await?,
                    }
                }
                None => self.fetch_chapter(store, novel_id, &current_id, &current_href, outcome).await?,
            };

            seen.insert(current_id.clone());
            collected.push(current_id);

            let Some(href) = prev_href else {
                tracing::debug!("Reached the first chapter of novel {}", novel_id);
                break;
            };

            match chapter_id_from_href(&href) {
                Some(prev_id) if seen.contains(&prev_id) => {
                    tracing::warn!(
                        "Chapter chain of novel {} loops back to chapter {}, stopping",
                        novel_id,
                        prev_id
                    );
                    break;
                }
                Some(prev_id) => {
                    current_id = prev_id;
                    current_href = href;
                }
                None => {
                    tracing::warn!(
                        "Cannot parse chapter id from {} ({}) in novel {}, treating it as the start",
                        href,
                        chapter_slug_from_href(&href).unwrap_or_default(),
                        novel_id
                    );
                    break;
                }
            }
        }

        Ok(collected)
    }

    /// Fetches one chapter, stores it unnumbered and returns its previous href
    async fn fetch_chapter<S: ChapterStore>(
        &self,
        store: &mut S,
        novel_id: &str,
        chapter_id: &str,
        href: &str,
        outcome: &mut DiscoveryOutcome,
    ) -> Result<Option<String>> {
        tracing::debug!("Fetching chapter {} of novel {}", chapter_id, novel_id);
        let page = self.fetcher.fetch_page(href).await?;
        let detail = extract_chapter_detail(&page.body)?;

        let chapter = Chapter::unnumbered(
            novel_id,
            chapter_id,
            detail.title,
            detail.content,
            detail.prev_chapter_href,
        );
        if chapter.is_broken {
            tracing::warn!("Chapter {} of novel {} has no content", chapter_id, novel_id);
        }

        store
            .put_chapter(&chapter)
            .with_context(|| chapter_context(novel_id, chapter_id))?;
        outcome.fetched += 1;

        Ok(chapter.prev_chapter_href)
    }

    /// Phase 2: numbers the collected chapters oldest first
    async fn assign_numbers<S: ChapterStore>(
        &self,
        store: &mut S,
        novel_id: &str,
        collected: &[String],
    ) -> Result<usize> {
        let Some(oldest_id) = collected.last() else {
            return Ok(0);
        };

        let oldest = load_chapter(store, novel_id, oldest_id)?;
        let mut number = baseline_number(store, &oldest)?;
        tracing::debug!("Numbering {} chapters of novel {} after #{}", collected.len(), novel_id, number);

        let mut numbered = 0;
        for (index, chapter_id) in collected.iter().rev().enumerate() {
            number += 1;

            let mut chapter = load_chapter(store, novel_id, chapter_id)?;
            if chapter.number.is_assigned() {
                tracing::debug!(
                    "Chapter {} of novel {} already numbered {}, leaving it",
                    chapter_id,
                    novel_id,
                    chapter.number
                );
                continue;
            }

            chapter.number = ChapterNumber::Assigned(number);
            store
                .put_chapter(&chapter)
                .with_context(|| chapter_context(novel_id, chapter_id))?;
            numbered += 1;

            if index + 1 < collected.len() && !self.persist_delay.is_zero() {
                tokio::time::sleep(self.persist_delay).await;
            }
        }

        Ok(numbered)
    }
}

fn chapter_context(novel_id: &str, chapter_id: &str) -> String {
    format!("novel {} chapter {}", novel_id, chapter_id)
}

fn load_chapter<S: ChapterStore>(store: &S, novel_id: &str, chapter_id: &str) -> Result<Chapter> {
    store
        .get_chapter(novel_id, chapter_id)
        .and_then(|found| {
            found.ok_or_else(|| {
                StorageError::Database("chapter missing before numbering".to_string())
            })
        })
        .with_context(|| chapter_context(novel_id, chapter_id))
}

/// Number of the stored chapter preceding `oldest`, or 0 at the start of the novel
fn baseline_number<S: ChapterStore>(store: &S, oldest: &Chapter) -> Result<u32> {
    let prev_id = oldest
        .prev_chapter_id
        .clone()
        .or_else(|| oldest.prev_chapter_href.as_deref().and_then(chapter_id_from_href));

    let Some(prev_id) = prev_id else {
        return Ok(0);
    };

    let prev = store
        .get_chapter(&oldest.novel_id, &prev_id)
        .with_context(|| chapter_context(&oldest.novel_id, &prev_id))?;

    Ok(prev.and_then(|c| c.number.value()).unwrap_or(0))
}

/// Decides whether `head` should replace the novel's latest pointer
///
/// The pointer only moves forward: when both chapters are numbered, the head
/// must carry the higher number.
fn should_advance_latest<S: ChapterStore>(
    store: &S,
    novel: &Novel,
    head: &ChapterSighting,
) -> Result<bool> {
    let Some(current_id) = novel.last_chapter_id() else {
        return Ok(true);
    };
    if current_id == head.chapter_id {
        return Ok(false);
    }

    let number_of = |chapter_id: &str| -> Result<Option<u32>> {
        Ok(store
            .get_chapter(&novel.novel_id, chapter_id)
            .with_context(|| chapter_context(&novel.novel_id, chapter_id))?
            .and_then(|c| c.number.value()))
    };

    match (number_of(&head.chapter_id)?, number_of(current_id)?) {
        (Some(head_number), Some(current_number)) => Ok(head_number > current_number),
        _ => Ok(true),
    }
}
