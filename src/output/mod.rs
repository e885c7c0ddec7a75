//! Output module for ingestion reports
//!
//! This module handles:
//! - Loading store-wide statistics (novels, chapters, broken and pending chapters)
//! - Checking per-novel numbering for gaps
//! - Printing the report for `--stats`

pub mod stats;

pub use stats::{load_statistics, numbering_is_contiguous, print_statistics, IngestStatistics};
