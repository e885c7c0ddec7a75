//! Consistency repair for the derived previous-chapter id
//!
//! `prev_chapter_id` is a copy of what `chapter_id_from_href` reads from the
//! stored `prev_chapter_href`. Rows written by this crate already agree, so a
//! pass over them changes nothing. Rows edited by hand or written by another
//! tool may disagree; the backfill rereads every stored href and rewrites the
//! ids that differ.

use crate::ids::chapter_id_from_href;
use crate::storage::ChapterStore;
use crate::{Result, StorageContext};
use std::time::Duration;

/// Counts from one backfill pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub updated: usize,
}

/// Rewrites every `prev_chapter_id` that does not match its href
///
/// Writes are spaced by `delay`.
pub async fn backfill_prev_chapter_ids<S: ChapterStore>(
    store: &mut S,
    delay: Duration,
) -> Result<BackfillReport> {
    let links = store
        .prev_chapter_links()
        .with_context(|| "reading chapter links".to_string())?;

    let mut report = BackfillReport {
        scanned: links.len(),
        updated: 0,
    };

    for link in links {
        let derived = link
            .prev_chapter_href
            .as_deref()
            .and_then(chapter_id_from_href);
        if derived == link.prev_chapter_id {
            continue;
        }

        if report.updated > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        tracing::debug!(
            "Novel {} chapter {}: prev id {:?} -> {:?}",
            link.novel_id,
            link.chapter_id,
            link.prev_chapter_id,
            derived
        );
        store
            .set_prev_chapter_id(&link.novel_id, &link.chapter_id, derived.as_deref())
            .with_context(|| format!("novel {} chapter {}", link.novel_id, link.chapter_id))?;
        report.updated += 1;
    }

    tracing::info!(
        "Backfill done: {} of {} chapters updated",
        report.updated,
        report.scanned
    );

    Ok(report)
}
