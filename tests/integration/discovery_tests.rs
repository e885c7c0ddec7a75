//! Discovery engine runs against a fake chapter chain

use crate::common::*;
use novel_ripple::crawler::{ChapterSighting, DiscoveryEngine, Fetcher};
use novel_ripple::model::BROKEN_CONTENT;
use novel_ripple::output::numbering_is_contiguous;
use novel_ripple::storage::{ChapterStore, NovelStore, SqliteStorage};
use novel_ripple::{ChapterNumber, CrawlerError, Novel};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(server: &MockServer) -> Fetcher {
    Fetcher::from_config(&create_test_config(&server.uri(), 1, ":memory:")).unwrap()
}

fn fresh_novel() -> Novel {
    Novel {
        novel_id: NOVEL.to_string(),
        title: "My Novel".to_string(),
        description: String::new(),
        cover: None,
        last_chapter: None,
    }
}

fn head(id: u32) -> ChapterSighting {
    ChapterSighting {
        chapter_id: id.to_string(),
        chapter_title: format!("Chapter {}", id),
        chapter_href: chapter_path(NOVEL, id),
    }
}

#[tokio::test]
async fn test_stops_at_dedup_boundary() {
    let server = MockServer::start().await;
    for id in 1..=5 {
        mount_chapter(&server, NOVEL, id, 0).await;
    }
    mount_chapter(&server, NOVEL, 6, 1).await;
    mount_chapter(&server, NOVEL, 7, 1).await;

    let mut store = SqliteStorage::new_in_memory().unwrap();
    seed_chapters(&mut store, NOVEL, 5);
    let mut novel = fresh_novel();
    novel.set_last_chapter("5", "Chapter 5");
    store.put_novel(&novel).unwrap();

    let fetcher = fetcher(&server);
    let outcome = DiscoveryEngine::new(&fetcher, Duration::ZERO)
        .discover(&mut store, &mut novel, &head(7))
        .await
        .unwrap();

    assert_eq!(outcome.fetched, 2);
    assert_eq!(outcome.numbered, 2);
    assert!(outcome.latest_updated);
    assert_eq!(numbers(&store, NOVEL), assigned(1..=7));

    let stored = store.get_novel(NOVEL).unwrap().unwrap();
    assert_eq!(stored.last_chapter_id(), Some("7"));
    let seventh = store.get_chapter(NOVEL, "7").unwrap().unwrap();
    assert_eq!(seventh.prev_chapter_id.as_deref(), Some("6"));
}

#[tokio::test]
async fn test_discovery_is_idempotent() {
    let server = MockServer::start().await;
    for id in 1..=3 {
        mount_chapter(&server, NOVEL, id, 1).await;
    }

    let mut store = SqliteStorage::new_in_memory().unwrap();
    let mut novel = fresh_novel();
    let fetcher = fetcher(&server);
    let engine = DiscoveryEngine::new(&fetcher, Duration::ZERO);

    let first = engine.discover(&mut store, &mut novel, &head(3)).await.unwrap();
    assert_eq!(first.fetched, 3);
    let after_first = numbers(&store, NOVEL);

    let second = engine.discover(&mut store, &mut novel, &head(3)).await.unwrap();
    assert_eq!(second.fetched, 0);
    assert_eq!(second.numbered, 0);
    assert!(!second.latest_updated);
    assert_eq!(numbers(&store, NOVEL), after_first);
    assert_eq!(after_first, assigned(1..=3));
}

#[tokio::test]
async fn test_numbering_stays_contiguous_across_runs() {
    let server = MockServer::start().await;
    for id in 1..=6 {
        mount_chapter(&server, NOVEL, id, 1).await;
    }

    let mut store = SqliteStorage::new_in_memory().unwrap();
    let mut novel = fresh_novel();
    let fetcher = fetcher(&server);
    let engine = DiscoveryEngine::new(&fetcher, Duration::from_millis(1));

    engine.discover(&mut store, &mut novel, &head(2)).await.unwrap();
    engine.discover(&mut store, &mut novel, &head(4)).await.unwrap();
    engine.discover(&mut store, &mut novel, &head(6)).await.unwrap();

    assert_eq!(numbers(&store, NOVEL), assigned(1..=6));
    assert!(numbering_is_contiguous(&store.known_chapters(NOVEL).unwrap()));
    assert_eq!(novel.last_chapter_id(), Some("6"));
}

#[tokio::test]
async fn test_broken_content_keeps_walking() {
    let server = MockServer::start().await;
    mount_chapter(&server, NOVEL, 1, 1).await;
    Mock::given(method("GET"))
        .and(path(chapter_path(NOVEL, 2)))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_page(
            "Chapter 2",
            Some(chapter_path(NOVEL, 1).as_str()),
            &["", "   "],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = SqliteStorage::new_in_memory().unwrap();
    let mut novel = fresh_novel();
    let fetcher = fetcher(&server);

    DiscoveryEngine::new(&fetcher, Duration::ZERO)
        .discover(&mut store, &mut novel, &head(2))
        .await
        .unwrap();

    let broken = store.get_chapter(NOVEL, "2").unwrap().unwrap();
    assert!(broken.is_broken);
    assert_eq!(broken.content, BROKEN_CONTENT);
    assert_eq!(broken.number, ChapterNumber::Assigned(2));

    let first = store.get_chapter(NOVEL, "1").unwrap().unwrap();
    assert!(!first.is_broken);
    assert_eq!(first.number, ChapterNumber::Assigned(1));
}

#[tokio::test]
async fn test_unparseable_prev_link_ends_the_chain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(chapter_path(NOVEL, 1)))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_page(
            "Chapter 1",
            Some("/my-novel/prologue.html"),
            &["Start."],
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/my-novel/prologue.html"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut store = SqliteStorage::new_in_memory().unwrap();
    let mut novel = fresh_novel();
    let fetcher = fetcher(&server);

    let outcome = DiscoveryEngine::new(&fetcher, Duration::ZERO)
        .discover(&mut store, &mut novel, &head(1))
        .await
        .unwrap();

    assert_eq!(outcome.fetched, 1);
    assert_eq!(numbers(&store, NOVEL), assigned(1..=1));
}

#[tokio::test]
async fn test_resumes_pending_chapters_after_failure() {
    let server = MockServer::start().await;
    mount_chapter(&server, NOVEL, 3, 1).await;
    mount_chapter(&server, NOVEL, 2, 1).await;
    Mock::given(method("GET"))
        .and(path(chapter_path(NOVEL, 1)))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_chapter(&server, NOVEL, 1, 1).await;

    let mut store = SqliteStorage::new_in_memory().unwrap();
    let mut novel = fresh_novel();
    let fetcher = fetcher(&server);
    let engine = DiscoveryEngine::new(&fetcher, Duration::ZERO);

    let failed = engine.discover(&mut store, &mut novel, &head(3)).await;
    assert!(matches!(failed, Err(CrawlerError::HttpStatus { status: 500, .. })));
    assert_eq!(
        numbers(&store, NOVEL),
        vec![(2, ChapterNumber::Unassigned), (3, ChapterNumber::Unassigned)]
    );
    assert_eq!(novel.last_chapter, None);
    assert!(store.get_novel(NOVEL).unwrap().is_none());

    let resumed = engine.discover(&mut store, &mut novel, &head(3)).await.unwrap();

    assert_eq!(resumed.resumed, 2);
    assert_eq!(resumed.fetched, 1);
    assert_eq!(resumed.numbered, 3);
    assert_eq!(numbers(&store, NOVEL), assigned(1..=3));
    assert_eq!(
        store.get_novel(NOVEL).unwrap().unwrap().last_chapter_id(),
        Some("3")
    );
}

#[tokio::test]
async fn test_older_head_does_not_move_latest_back() {
    let server = MockServer::start().await;
    for id in 1..=3 {
        mount_chapter(&server, NOVEL, id, 1).await;
    }

    let mut store = SqliteStorage::new_in_memory().unwrap();
    let mut novel = fresh_novel();
    let fetcher = fetcher(&server);
    let engine = DiscoveryEngine::new(&fetcher, Duration::ZERO);

    engine.discover(&mut store, &mut novel, &head(3)).await.unwrap();
    let stale = engine.discover(&mut store, &mut novel, &head(2)).await.unwrap();

    assert!(!stale.latest_updated);
    assert_eq!(
        store.get_novel(NOVEL).unwrap().unwrap().last_chapter_id(),
        Some("3")
    );
}
