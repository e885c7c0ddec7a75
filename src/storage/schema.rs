//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Novel-Ripple database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track ingestion runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    pages INTEGER NOT NULL DEFAULT 0,
    rows_seen INTEGER NOT NULL DEFAULT 0,
    rows_skipped INTEGER NOT NULL DEFAULT 0,
    novels_created INTEGER NOT NULL DEFAULT 0,
    chapters_added INTEGER NOT NULL DEFAULT 0
);

-- One row per novel, keyed by the id derived from its page href
CREATE TABLE IF NOT EXISTS novels (
    novel_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    cover_data BLOB,
    cover_key TEXT,
    cover_content_type TEXT,
    last_chapter_id TEXT,
    last_chapter_title TEXT,
    last_chapter_update TEXT
);

-- Chapters are written before their novel row exists, so novel_id is not a foreign key.
-- number is NULL until the numbering pass assigns it.
CREATE TABLE IF NOT EXISTS chapters (
    novel_id TEXT NOT NULL,
    chapter_id TEXT NOT NULL,
    number INTEGER,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    is_broken INTEGER NOT NULL DEFAULT 0,
    prev_chapter_href TEXT,
    prev_chapter_id TEXT,
    created_at TEXT NOT NULL,
    PRIMARY KEY (novel_id, chapter_id)
);

CREATE INDEX IF NOT EXISTS idx_chapters_number ON chapters(novel_id, number);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
