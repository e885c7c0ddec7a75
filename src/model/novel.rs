use chrono::{DateTime, Utc};

/// Where a novel's cover image lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverRef {
    /// Raw bytes kept on the novel record
    Inline { data: Vec<u8>, content_type: String },
    /// Key returned by an asset store
    Stored { key: String, content_type: String },
}

impl CoverRef {
    pub fn content_type(&self) -> &str {
        match self {
            Self::Inline { content_type, .. } | Self::Stored { content_type, .. } => content_type,
        }
    }
}

/// The newest chapter known for a novel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestChapter {
    pub chapter_id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// A stored novel
#[derive(Debug, Clone, PartialEq)]
pub struct Novel {
    pub novel_id: String,
    pub title: String,
    pub description: String,
    pub cover: Option<CoverRef>,
    /// `None` until the first discovery run for the novel completes
    pub last_chapter: Option<LatestChapter>,
}

impl Novel {
    /// Id of the newest known chapter
    pub fn last_chapter_id(&self) -> Option<&str> {
        self.last_chapter.as_ref().map(|c| c.chapter_id.as_str())
    }

    /// Points the novel at a newer chapter, stamping the update time
    pub fn set_last_chapter(&mut self, chapter_id: &str, title: &str) {
        self.last_chapter = Some(LatestChapter {
            chapter_id: chapter_id.to_string(),
            title: title.to_string(),
            updated_at: Utc::now(),
        });
    }
}
