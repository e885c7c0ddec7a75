//! Novel-Ripple: an incremental novel chapter ingester
//!
//! This crate walks a paginated "latest releases" listing, and for every novel
//! it sees follows the chapter chain backwards from the newest chapter until it
//! reaches chapters it already stored. New chapters are persisted first with an
//! unassigned number and numbered in a second pass, so the per-novel numbering
//! stays dense even though the source only links each chapter to its predecessor.

pub mod config;
pub mod crawler;
pub mod ids;
pub mod model;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for Novel-Ripple operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing {field} reference on {page}")]
    MissingReference { field: &'static str, page: String },

    #[error("Cannot derive identifier from {href}")]
    UnparseableIdentifier { href: String },

    #[error("HTTP error for {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Storage error ({context}): {source}")]
    Storage {
        context: String,
        source: storage::StorageError,
    },

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<storage::StorageError> for CrawlerError {
    fn from(source: storage::StorageError) -> Self {
        Self::Storage {
            context: "storage".to_string(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while pulling structured fields out of a page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
}

/// Result type alias for Novel-Ripple operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Attaches novel/chapter context to storage failures
pub(crate) trait StorageContext<T> {
    fn with_context(self, context: impl FnOnce() -> String) -> Result<T>;
}

impl<T> StorageContext<T> for std::result::Result<T, storage::StorageError> {
    fn with_context(self, context: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|source| CrawlerError::Storage {
            context: context(),
            source,
        })
    }
}

// Re-export commonly used types
pub use config::Config;
pub use model::{Chapter, ChapterNumber, CoverRef, Novel};
