//! HTML extraction for listing, novel and chapter pages
//!
//! This module turns page bodies into structured fields:
//! - Listing rows (novel href, newest chapter href and title)
//! - Novel details (title, description, cover href)
//! - Chapter details (title, text content, previous-chapter href)
//!
//! Selectors target the source site's markup and are fixed.

use crate::ExtractError;
use scraper::{ElementRef, Html, Selector};

const LISTING_ROW: &str = "div.col-truyen-main div.row";
const ROW_NOVEL_LINK: &str = ".truyen-title a";
const ROW_CHAPTER_LINK: &str = ".text-info a";
const ROW_CHAPTER_TITLE: &str = ".text-info span";

const NOVEL_TITLE: &str = "div.books .title";
const NOVEL_DESCRIPTION: &str = "div.desc-text";
const NOVEL_COVER: &str = "div.books img";

const CHAPTER_TITLE: &str = "a.chapter-title";
const CHAPTER_PREV_LINK: &str = "a#prev_chap";
const CHAPTER_BLOCKS: &str = "div.chapter-c p";

/// One row of the latest-releases listing
///
/// The hrefs stay optional here; the walker decides what a missing one means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub novel_href: Option<String>,
    pub chapter_href: Option<String>,
    pub chapter_title: String,
}

/// Fields of a novel's detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovelDetail {
    pub title: String,
    pub description: String,
    pub cover_href: Option<String>,
}

/// Fields of a chapter page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDetail {
    pub title: String,
    /// Non-empty paragraphs, each prefixed with a newline
    pub content: String,
    /// `None` on the novel's first chapter
    pub prev_chapter_href: Option<String>,
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

fn first_attr(scope: ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    scope
        .select(sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn all_text(scope: ElementRef<'_>, sel: &Selector) -> String {
    scope
        .select(sel)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Extracts the listing rows in page order
pub fn extract_listing_rows(html: &str) -> Result<Vec<ListingRow>, ExtractError> {
    let document = Html::parse_document(html);
    let row_sel = selector(LISTING_ROW)?;
    let novel_sel = selector(ROW_NOVEL_LINK)?;
    let chapter_sel = selector(ROW_CHAPTER_LINK)?;
    let title_sel = selector(ROW_CHAPTER_TITLE)?;

    let rows = document
        .select(&row_sel)
        .map(|row| ListingRow {
            novel_href: first_attr(row, &novel_sel, "href"),
            chapter_href: first_attr(row, &chapter_sel, "href"),
            chapter_title: all_text(row, &title_sel),
        })
        .collect();

    Ok(rows)
}

/// Extracts title, description and cover href from a novel page
pub fn extract_novel_detail(html: &str) -> Result<NovelDetail, ExtractError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    Ok(NovelDetail {
        title: all_text(root, &selector(NOVEL_TITLE)?),
        description: all_text(root, &selector(NOVEL_DESCRIPTION)?),
        cover_href: first_attr(root, &selector(NOVEL_COVER)?, "src"),
    })
}

/// Extracts title, text and previous-chapter href from a chapter page
pub fn extract_chapter_detail(html: &str) -> Result<ChapterDetail, ExtractError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let blocks = selector(CHAPTER_BLOCKS)?;
    let mut content = String::new();
    for block in root.select(&blocks) {
        let text: String = block.text().collect();
        if !text.is_empty() {
            content.push('\n');
            content.push_str(&text);
        }
    }

    Ok(ChapterDetail {
        title: all_text(root, &selector(CHAPTER_TITLE)?),
        content,
        prev_chapter_href: first_attr(root, &selector(CHAPTER_PREV_LINK)?, "href"),
    })
}
