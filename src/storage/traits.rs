//! Storage traits and error types
//!
//! This module defines the trait interfaces for the novel, chapter, run and
//! asset stores, and the associated error types.

use crate::model::{Chapter, ChapterNumber, Novel};
use crate::storage::{RunRecord, RunStats, RunStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A stored chapter's link to its predecessor, as read for backfilling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrevChapterLink {
    pub novel_id: String,
    pub chapter_id: String,
    pub prev_chapter_href: Option<String>,
    pub prev_chapter_id: Option<String>,
}

/// Keyed access to novel records
pub trait NovelStore {
    /// Gets a novel by id
    fn get_novel(&self, novel_id: &str) -> StorageResult<Option<Novel>>;

    /// Inserts or replaces a novel
    fn put_novel(&mut self, novel: &Novel) -> StorageResult<()>;

    /// Ids of every stored novel, sorted
    fn list_novel_ids(&self) -> StorageResult<Vec<String>>;
}

/// Keyed access to chapter records
pub trait ChapterStore {
    /// Every stored chapter id of a novel with its current number
    ///
    /// This is the membership map the discovery walk checks at each step.
    fn known_chapters(&self, novel_id: &str) -> StorageResult<HashMap<String, ChapterNumber>>;

    /// Gets one chapter
    fn get_chapter(&self, novel_id: &str, chapter_id: &str) -> StorageResult<Option<Chapter>>;

    /// Inserts or replaces a chapter
    fn put_chapter(&mut self, chapter: &Chapter) -> StorageResult<()>;

    /// Predecessor links of every stored chapter
    fn prev_chapter_links(&self) -> StorageResult<Vec<PrevChapterLink>>;

    /// Overwrites the derived predecessor id of one chapter
    fn set_prev_chapter_id(
        &mut self,
        novel_id: &str,
        chapter_id: &str,
        prev_chapter_id: Option<&str>,
    ) -> StorageResult<()>;

    // ===== Statistics =====

    fn count_chapters(&self) -> StorageResult<u64>;

    fn count_broken_chapters(&self) -> StorageResult<u64>;

    /// Chapters still waiting for a number
    fn count_pending_chapters(&self) -> StorageResult<u64>;
}

/// Bookkeeping for ingestion runs
pub trait RunStore {
    /// Creates a new run in the `Running` state
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by id
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Closes a run with its final status and counters
    fn finish_run(&mut self, run_id: i64, status: RunStatus, stats: &RunStats)
        -> StorageResult<()>;
}

/// Blob storage for cover images
pub trait AssetStore {
    /// Stores `bytes` under `key` and returns a durable reference to them
    fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> StorageResult<String>;
}
