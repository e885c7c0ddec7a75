use crate::ids::chapter_id_from_href;
use chrono::{DateTime, Utc};
use std::fmt;

/// Content stored for chapters whose page yielded no text
pub const BROKEN_CONTENT: &str = "Broken Content";

/// Position of a chapter within its novel
///
/// Chapters are written as `Unassigned` while the backward walk is still
/// collecting them, and receive their number once the whole new run is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChapterNumber {
    #[default]
    Unassigned,
    Assigned(u32),
}

impl ChapterNumber {
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    /// Returns the assigned number, if any
    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Assigned(n) => Some(*n),
            Self::Unassigned => None,
        }
    }

    /// Column value: `NULL` while unassigned
    pub fn to_db(&self) -> Option<u32> {
        self.value()
    }

    /// Reads the column back; a stored `0` is also treated as unassigned
    pub fn from_db(value: Option<u32>) -> Self {
        match value {
            Some(n) if n > 0 => Self::Assigned(n),
            _ => Self::Unassigned,
        }
    }
}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assigned(n) => write!(f, "{}", n),
            Self::Unassigned => write!(f, "unassigned"),
        }
    }
}

/// A stored chapter
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub novel_id: String,
    pub chapter_id: String,
    pub number: ChapterNumber,
    pub title: String,
    pub content: String,
    pub is_broken: bool,
    /// Href of the chronologically preceding chapter, `None` for the first one
    pub prev_chapter_href: Option<String>,
    pub prev_chapter_id: Option<String>,
    /// Ingestion time, not publication time
    pub created_at: DateTime<Utc>,
}

impl Chapter {
    /// Builds a freshly fetched chapter with an unassigned number
    ///
    /// Whitespace-only content is replaced by [`BROKEN_CONTENT`] and the
    /// chapter is flagged broken.
    pub fn unnumbered(
        novel_id: &str,
        chapter_id: &str,
        title: String,
        content: String,
        prev_chapter_href: Option<String>,
    ) -> Self {
        let (content, is_broken) = if content.trim().is_empty() {
            (BROKEN_CONTENT.to_string(), true)
        } else {
            (content, false)
        };

        let prev_chapter_id = prev_chapter_href.as_deref().and_then(chapter_id_from_href);

        Self {
            novel_id: novel_id.to_string(),
            chapter_id: chapter_id.to_string(),
            number: ChapterNumber::Unassigned,
            title,
            content,
            is_broken,
            prev_chapter_href,
            prev_chapter_id,
            created_at: Utc::now(),
        }
    }
}
