//! Statistics generation from the novel database
//!
//! This module provides functionality for extracting and displaying
//! ingestion statistics from the storage layer.

use crate::model::ChapterNumber;
use crate::storage::{ChapterStore, NovelStore, RunRecord, RunStore, StorageResult};
use std::collections::HashMap;

/// Store-wide ingestion statistics
#[derive(Debug, Clone)]
pub struct IngestStatistics {
    /// Number of stored novels
    pub novels: u64,

    /// Number of stored chapters
    pub chapters: u64,

    /// Chapters stored with the broken-content sentinel
    pub broken: u64,

    /// Chapters still waiting for a number
    pub pending: u64,

    /// Novels whose assigned numbers are not exactly `1..=N`
    pub non_contiguous: Vec<String>,

    /// The most recent ingestion run, if any
    pub latest_run: Option<RunRecord>,
}

/// True when the assigned numbers of a novel are exactly `1..=N`
///
/// Unassigned chapters are ignored.
///
/// # Examples
///
/// ```
/// use novel_ripple::output::numbering_is_contiguous;
/// use novel_ripple::ChapterNumber;
/// use std::collections::HashMap;
///
/// let mut known = HashMap::new();
/// known.insert("1".to_string(), ChapterNumber::Assigned(1));
/// known.insert("2".to_string(), ChapterNumber::Assigned(2));
/// assert!(numbering_is_contiguous(&known));
///
/// known.insert("4".to_string(), ChapterNumber::Assigned(4));
/// assert!(!numbering_is_contiguous(&known));
/// ```
pub fn numbering_is_contiguous(known: &HashMap<String, ChapterNumber>) -> bool {
    let mut numbers: Vec<u32> = known.values().filter_map(|n| n.value()).collect();
    numbers.sort_unstable();

    numbers
        .iter()
        .enumerate()
        .all(|(index, &number)| number as usize == index + 1)
}

/// Loads statistics from storage
pub fn load_statistics<S>(storage: &S) -> StorageResult<IngestStatistics>
where
    S: NovelStore + ChapterStore + RunStore,
{
    let novel_ids = storage.list_novel_ids()?;

    let mut non_contiguous = Vec::new();
    for novel_id in &novel_ids {
        if !numbering_is_contiguous(&storage.known_chapters(novel_id)?) {
            non_contiguous.push(novel_id.clone());
        }
    }

    Ok(IngestStatistics {
        novels: novel_ids.len() as u64,
        chapters: storage.count_chapters()?,
        broken: storage.count_broken_chapters()?,
        pending: storage.count_pending_chapters()?,
        non_contiguous,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IngestStatistics) {
    println!("=== Ingestion Statistics ===\n");

    println!("Overview:");
    println!("  Novels: {}", stats.novels);
    println!("  Chapters: {}", stats.chapters);
    println!("  Broken chapters: {}", stats.broken);
    println!("  Chapters awaiting a number: {}", stats.pending);
    println!();

    if !stats.non_contiguous.is_empty() {
        println!(
            "Novels with gaps in numbering ({}):",
            stats.non_contiguous.len()
        );
        for novel_id in &stats.non_contiguous {
            println!("  - {}", novel_id);
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  Id: {}", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!(
                "  Pages: {}, rows: {} ({} skipped)",
                run.stats.pages, run.stats.rows, run.stats.skipped_rows
            );
            println!(
                "  New novels: {}, new chapters: {}",
                run.stats.novels_created, run.stats.chapters_added
            );
        }
        None => println!("No ingestion runs recorded."),
    }
}
