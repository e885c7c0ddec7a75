//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the novel, chapter
//! and run stores.

use crate::model::{Chapter, ChapterNumber, CoverRef, LatestChapter, Novel};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    ChapterStore, NovelStore, PrevChapterLink, RunStore, StorageError, StorageResult,
};
use crate::storage::{RunRecord, RunStats, RunStatus};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const CHAPTER_COLUMNS: &str = "novel_id, chapter_id, number, title, content, is_broken,
     prev_chapter_href, prev_chapter_id, created_at";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status,
     pages, rows_seen, rows_skipped, novels_created, chapters_added";

/// SQLite storage backend
///
/// One instance is opened at process start and passed by `&mut` to the
/// walker; [`SqliteStorage::close`] releases it at the end of the run.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Closes the connection, surfacing any error SQLite reports on close
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| StorageError::Sqlite(e))
    }
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn chapter_from_row(row: &Row<'_>) -> rusqlite::Result<Chapter> {
    Ok(Chapter {
        novel_id: row.get(0)?,
        chapter_id: row.get(1)?,
        number: ChapterNumber::from_db(row.get(2)?),
        title: row.get(3)?,
        content: row.get(4)?,
        is_broken: row.get::<_, i64>(5)? != 0,
        prev_chapter_href: row.get(6)?,
        prev_chapter_id: row.get(7)?,
        created_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
    })
}

fn novel_from_row(row: &Row<'_>) -> rusqlite::Result<Novel> {
    let cover_data: Option<Vec<u8>> = row.get(3)?;
    let cover_key: Option<String> = row.get(4)?;
    let cover_content_type: Option<String> = row.get(5)?;

    let cover = match (cover_data, cover_key) {
        (Some(data), _) => Some(CoverRef::Inline {
            data,
            content_type: cover_content_type.unwrap_or_default(),
        }),
        (None, Some(key)) => Some(CoverRef::Stored {
            key,
            content_type: cover_content_type.unwrap_or_default(),
        }),
        (None, None) => None,
    };

    let last_chapter_id: Option<String> = row.get(6)?;
    let last_chapter = match last_chapter_id {
        Some(chapter_id) => {
            let updated: Option<String> = row.get(8)?;
            Some(LatestChapter {
                chapter_id,
                title: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                updated_at: match updated {
                    Some(ts) => parse_timestamp(8, &ts)?,
                    None => DateTime::<Utc>::default(),
                },
            })
        }
        None => None,
    };

    Ok(Novel {
        novel_id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        cover,
        last_chapter,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Failed),
        stats: RunStats {
            pages: row.get(5)?,
            rows: row.get(6)?,
            skipped_rows: row.get(7)?,
            novels_created: row.get(8)?,
            chapters_added: row.get(9)?,
        },
    })
}

impl NovelStore for SqliteStorage {
    fn get_novel(&self, novel_id: &str) -> StorageResult<Option<Novel>> {
        let novel = self
            .conn
            .query_row(
                "SELECT novel_id, title, description, cover_data, cover_key, cover_content_type,
                 last_chapter_id, last_chapter_title, last_chapter_update
                 FROM novels WHERE novel_id = ?1",
                params![novel_id],
                novel_from_row,
            )
            .optional()?;
        Ok(novel)
    }

    fn put_novel(&mut self, novel: &Novel) -> StorageResult<()> {
        let (cover_data, cover_key) = match &novel.cover {
            Some(CoverRef::Inline { data, .. }) => (Some(data.as_slice()), None),
            Some(CoverRef::Stored { key, .. }) => (None, Some(key.as_str())),
            None => (None, None),
        };
        let cover_content_type = novel.cover.as_ref().map(CoverRef::content_type);
        let last = novel.last_chapter.as_ref();

        self.conn.execute(
            "INSERT INTO novels (novel_id, title, description, cover_data, cover_key,
             cover_content_type, last_chapter_id, last_chapter_title, last_chapter_update)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(novel_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                cover_data = excluded.cover_data,
                cover_key = excluded.cover_key,
                cover_content_type = excluded.cover_content_type,
                last_chapter_id = excluded.last_chapter_id,
                last_chapter_title = excluded.last_chapter_title,
                last_chapter_update = excluded.last_chapter_update",
            params![
                novel.novel_id,
                novel.title,
                novel.description,
                cover_data,
                cover_key,
                cover_content_type,
                last.map(|l| l.chapter_id.as_str()),
                last.map(|l| l.title.as_str()),
                last.map(|l| l.updated_at.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn list_novel_ids(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT novel_id FROM novels ORDER BY novel_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

impl ChapterStore for SqliteStorage {
    fn known_chapters(&self, novel_id: &str) -> StorageResult<HashMap<String, ChapterNumber>> {
        let mut stmt = self
            .conn
            .prepare("SELECT chapter_id, number FROM chapters WHERE novel_id = ?1")?;

        let mut known = HashMap::new();
        let rows = stmt.query_map(params![novel_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<u32>>(1)?))
        })?;

        for row in rows {
            let (chapter_id, number) = row?;
            known.insert(chapter_id, ChapterNumber::from_db(number));
        }

        Ok(known)
    }

    fn get_chapter(&self, novel_id: &str, chapter_id: &str) -> StorageResult<Option<Chapter>> {
        let chapter = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM chapters WHERE novel_id = ?1 AND chapter_id = ?2",
                    CHAPTER_COLUMNS
                ),
                params![novel_id, chapter_id],
                chapter_from_row,
            )
            .optional()?;
        Ok(chapter)
    }

    fn put_chapter(&mut self, chapter: &Chapter) -> StorageResult<()> {
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO chapters ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                CHAPTER_COLUMNS
            ),
            params![
                chapter.novel_id,
                chapter.chapter_id,
                chapter.number.to_db(),
                chapter.title,
                chapter.content,
                chapter.is_broken as i64,
                chapter.prev_chapter_href,
                chapter.prev_chapter_id,
                chapter.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn prev_chapter_links(&self) -> StorageResult<Vec<PrevChapterLink>> {
        let mut stmt = self.conn.prepare(
            "SELECT novel_id, chapter_id, prev_chapter_href, prev_chapter_id
             FROM chapters ORDER BY novel_id, chapter_id",
        )?;

        let links = stmt
            .query_map([], |row| {
                Ok(PrevChapterLink {
                    novel_id: row.get(0)?,
                    chapter_id: row.get(1)?,
                    prev_chapter_href: row.get(2)?,
                    prev_chapter_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn set_prev_chapter_id(
        &mut self,
        novel_id: &str,
        chapter_id: &str,
        prev_chapter_id: Option<&str>,
    ) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE chapters SET prev_chapter_id = ?1 WHERE novel_id = ?2 AND chapter_id = ?3",
            params![prev_chapter_id, novel_id, chapter_id],
        )?;
        Ok(())
    }

    fn count_chapters(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chapters", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_broken_chapters(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chapters WHERE is_broken != 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_pending_chapters(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chapters WHERE number IS NULL OR number = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl RunStore for SqliteStorage {
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &RunStats,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages = ?3, rows_seen = ?4,
             rows_skipped = ?5, novels_created = ?6, chapters_added = ?7 WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                stats.pages,
                stats.rows,
                stats.skipped_rows,
                stats.novels_created,
                stats.chapters_added,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}
