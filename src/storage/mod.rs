//! Storage module for persisting novels, chapters and runs
//!
//! This module handles all persistence for the ingester, including:
//! - SQLite database initialization and schema management
//! - Novel and chapter records
//! - Run tracking
//! - Cover image assets kept outside the database

mod assets;
mod schema;
mod sqlite;
mod traits;

pub use assets::{cover_key, FsAssetStore};
pub use sqlite::SqliteStorage;
pub use traits::{
    AssetStore, ChapterStore, NovelStore, PrevChapterLink, RunStore, StorageError,
    StorageResult,
};

use std::path::Path;

/// Opens (creating if needed) the storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Counters collected while walking the listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Listing pages fetched
    pub pages: u32,
    /// Listing rows seen
    pub rows: u32,
    /// Rows skipped because their chapter id could not be parsed
    pub skipped_rows: u32,
    /// Novels bootstrapped during the run
    pub novels_created: u32,
    /// Chapters newly stored during the run
    pub chapters_added: u32,
}

/// Represents an ingestion run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub stats: RunStats,
}

/// Status of an ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
