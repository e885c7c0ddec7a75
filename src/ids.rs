//! Identifier derivation from listing and chapter hrefs
//!
//! Novel ids come from the novel page's file name (`/my-novel.html` →
//! `my-novel`); chapter ids are the number embedded in the chapter file name
//! (`/my-novel/chapter-12-title.html` → `12`). Hrefs may be relative or absolute.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static CHAPTER_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"chapter-(\d+)-?").expect("hardcoded regex pattern is valid"));

/// Extracts the chapter id from a chapter href
///
/// Only the file name is read, so a novel slug such as `chapter-2-reborn`
/// never leaks into the id. Returns `None` when the file name does not follow
/// the `chapter-<digits>` pattern.
///
/// # Examples
///
/// ```
/// use novel_ripple::ids::chapter_id_from_href;
///
/// assert_eq!(chapter_id_from_href("/my-novel/chapter-12-title.html"), Some("12".to_string()));
/// assert_eq!(chapter_id_from_href("/my-novel/prologue.html"), None);
/// ```
pub fn chapter_id_from_href(href: &str) -> Option<String> {
    let stem = page_stem(href)?;
    CHAPTER_ID_REGEX
        .captures(&stem)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Derives the novel id from a novel page href
///
/// # Examples
///
/// ```
/// use novel_ripple::ids::novel_id_from_href;
///
/// assert_eq!(novel_id_from_href("/my-novel.html"), Some("my-novel".to_string()));
/// assert_eq!(novel_id_from_href("https://site.example/my-novel.html"), Some("my-novel".to_string()));
/// ```
pub fn novel_id_from_href(href: &str) -> Option<String> {
    page_stem(href)
}

/// The chapter file name without `.html`, for chapters with no numeric id
pub fn chapter_slug_from_href(href: &str) -> Option<String> {
    page_stem(href)
}

/// Last path segment of an href with a trailing `.html` removed
fn page_stem(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let path = match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        // Relative hrefs: drop query and fragment by hand
        Err(_) => href
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = path.rsplit('/').find(|s| !s.is_empty())?;
    let stem = segment.strip_suffix(".html").unwrap_or(segment);

    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
