//! Domain records persisted by the stores
//!
//! - `Novel`: one row per novel, keyed by the id derived from its listing href
//! - `Chapter`: one row per chapter, keyed by `(novel_id, chapter_id)`
//! - `ChapterNumber`: the assigned/unassigned position of a chapter in its novel

mod chapter;
mod novel;

pub use chapter::{Chapter, ChapterNumber, BROKEN_CONTENT};
pub use novel::{CoverRef, LatestChapter, Novel};
