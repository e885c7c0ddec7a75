//! Full ingestion runs over a fake listing

use crate::common::*;
use novel_ripple::crawler::{ingest_into, run_ingest};
use novel_ripple::storage::{NovelStore, RunStatus, RunStore, SqliteStorage};
use novel_ripple::{CoverRef, CrawlerError};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_end_to_end_new_novel() {
    let server = MockServer::start().await;
    let head = chapter_path(NOVEL, 12);
    mount_listing(&server, 0, &[(Some("/my-novel.html"), Some(head.as_str()))]).await;
    mount_novel(&server, NOVEL, 1).await;
    for id in 1..=12 {
        mount_chapter(&server, NOVEL, id, 1).await;
    }

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let mut store = SqliteStorage::new_in_memory().unwrap();

    let stats = ingest_into(&config, "hash", &mut store).await.unwrap();

    assert_eq!(stats.pages, 1);
    assert_eq!(stats.rows, 1);
    assert_eq!(stats.novels_created, 1);
    assert_eq!(stats.chapters_added, 12);

    let novel = store.get_novel(NOVEL).unwrap().unwrap();
    assert_eq!(novel.title, "My Novel");
    assert_eq!(novel.description, "A story.");
    assert_eq!(novel.last_chapter_id(), Some("12"));
    assert_eq!(novel.last_chapter.unwrap().title, "Latest");
    assert!(matches!(novel.cover, Some(CoverRef::Inline { .. })));
    assert_eq!(numbers(&store, NOVEL), assigned(1..=12));

    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "hash");
    assert_eq!(run.stats, stats);
}

#[tokio::test]
async fn test_bootstrap_runs_once_per_novel() {
    let server = MockServer::start().await;
    let older = chapter_path(NOVEL, 10);
    let newer = chapter_path(NOVEL, 12);
    // Page 1 holds the older release and is walked first
    mount_listing(&server, 1, &[(Some("/my-novel.html"), Some(older.as_str()))]).await;
    mount_listing(&server, 0, &[(Some("/my-novel.html"), Some(newer.as_str()))]).await;
    mount_novel(&server, NOVEL, 1).await;
    for id in 1..=12 {
        mount_chapter(&server, NOVEL, id, 1).await;
    }

    let config = create_test_config(&server.uri(), 2, ":memory:");
    let mut store = SqliteStorage::new_in_memory().unwrap();

    let stats = ingest_into(&config, "hash", &mut store).await.unwrap();

    assert_eq!(stats.pages, 2);
    assert_eq!(stats.novels_created, 1);
    assert_eq!(stats.chapters_added, 12);
    assert_eq!(numbers(&store, NOVEL), assigned(1..=12));
    assert_eq!(
        store.get_novel(NOVEL).unwrap().unwrap().last_chapter_id(),
        Some("12")
    );
}

#[tokio::test]
async fn test_repeated_novel_rows_on_one_page() {
    let server = MockServer::start().await;
    let newer = chapter_path(NOVEL, 3);
    let older = chapter_path(NOVEL, 2);
    mount_listing(
        &server,
        0,
        &[
            (Some("/my-novel.html"), Some(newer.as_str())),
            (Some("/my-novel.html"), Some(older.as_str())),
        ],
    )
    .await;
    mount_novel(&server, NOVEL, 1).await;
    for id in 1..=3 {
        mount_chapter(&server, NOVEL, id, 1).await;
    }

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let mut store = SqliteStorage::new_in_memory().unwrap();

    let stats = ingest_into(&config, "hash", &mut store).await.unwrap();

    assert_eq!(stats.rows, 2);
    assert_eq!(numbers(&store, NOVEL), assigned(1..=3));
    assert_eq!(
        store.get_novel(NOVEL).unwrap().unwrap().last_chapter_id(),
        Some("3")
    );
}

#[tokio::test]
async fn test_missing_chapter_reference_fails_run() {
    let server = MockServer::start().await;
    mount_listing(&server, 0, &[(Some("/my-novel.html"), None)]).await;
    mount_novel(&server, NOVEL, 0).await;

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let mut store = SqliteStorage::new_in_memory().unwrap();

    let result = ingest_into(&config, "hash", &mut store).await;

    assert!(matches!(
        result,
        Err(CrawlerError::MissingReference { field: "chapter", .. })
    ));
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.stats.rows, 1);
}

#[tokio::test]
async fn test_unparseable_row_is_skipped() {
    let server = MockServer::start().await;
    let head = chapter_path(NOVEL, 1);
    mount_listing(
        &server,
        0,
        &[
            (Some("/my-novel.html"), Some(head.as_str())),
            (Some("/other.html"), Some("/other/prologue.html")),
        ],
    )
    .await;
    mount_novel(&server, NOVEL, 1).await;
    mount_novel(&server, "other", 0).await;
    mount_chapter(&server, NOVEL, 1, 1).await;

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let mut store = SqliteStorage::new_in_memory().unwrap();

    let stats = ingest_into(&config, "hash", &mut store).await.unwrap();

    assert_eq!(stats.rows, 2);
    assert_eq!(stats.skipped_rows, 1);
    assert_eq!(stats.novels_created, 1);
    assert!(store.get_novel("other").unwrap().is_none());
}

#[tokio::test]
async fn test_listing_failure_fails_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), 3, ":memory:");
    let mut store = SqliteStorage::new_in_memory().unwrap();

    let result = ingest_into(&config, "hash", &mut store).await;

    assert!(matches!(result, Err(CrawlerError::HttpStatus { status: 503, .. })));
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.stats.pages, 0);
}

#[tokio::test]
async fn test_run_ingest_persists_between_runs() {
    let server = MockServer::start().await;
    let head = chapter_path(NOVEL, 3);
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[(
            Some("/my-novel.html"),
            Some(head.as_str()),
        )])))
        .expect(2)
        .mount(&server)
        .await;
    mount_novel(&server, NOVEL, 1).await;
    for id in 1..=3 {
        mount_chapter(&server, NOVEL, id, 1).await;
    }

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("novels.db");
    let config = create_test_config(&server.uri(), 1, &db_path.to_string_lossy());

    let first = run_ingest(&config, "hash").await.unwrap();
    let second = run_ingest(&config, "hash").await.unwrap();

    assert_eq!(first.chapters_added, 3);
    assert_eq!(second.chapters_added, 0);
    assert_eq!(second.novels_created, 0);

    let store = SqliteStorage::new(Path::new(&db_path)).unwrap();
    assert_eq!(numbers(&store, NOVEL), assigned(1..=3));
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.id, 2);
    assert_eq!(run.status, RunStatus::Completed);
}
