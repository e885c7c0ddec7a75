//! Fake site pages and configuration shared by the integration tests

use novel_ripple::config::{
    Config, CoverConfig, CrawlerConfig, SourceConfig, StorageConfig, UserAgentConfig,
};
use novel_ripple::storage::{ChapterStore, SqliteStorage};
use novel_ripple::{Chapter, ChapterNumber};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const NOVEL: &str = "my-novel";

/// Creates a test configuration pointed at the mock server
pub fn create_test_config(base_url: &str, page_count: u32, db_path: &str) -> Config {
    Config {
        source: SourceConfig {
            base_url: base_url.to_string(),
            listing_path: "/latest?page={page}".to_string(),
            first_page: 0,
            page_count,
            request_timeout_ms: 5_000,
        },
        crawler: CrawlerConfig { persist_delay_ms: 0 },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        storage: StorageConfig {
            database_path: db_path.to_string(),
        },
        covers: CoverConfig::default(),
    }
}

/// Site path of chapter `id`; chapter 12 carries a title slug like the real site
pub fn chapter_path(novel: &str, id: u32) -> String {
    if id == 12 {
        format!("/{}/chapter-{}-title.html", novel, id)
    } else {
        format!("/{}/chapter-{}.html", novel, id)
    }
}

pub fn chapter_page(title: &str, prev_href: Option<&str>, paragraphs: &[&str]) -> String {
    let prev = prev_href
        .map(|href| format!(r#"<a id="prev_chap" href="{}">Prev</a>"#, href))
        .unwrap_or_default();
    let body: String = paragraphs.iter().map(|p| format!("<p>{}</p>", p)).collect();

    format!(
        r##"<html><body>
        <a class="chapter-title" href="#">{}</a>
        {}
        <div class="chapter-c">{}</div>
        </body></html>"##,
        title, prev, body
    )
}

/// Serves chapter `id` of `novel`, linking back to `id - 1` unless it is the first
pub async fn mount_chapter(server: &MockServer, novel: &str, id: u32, expected_fetches: u64) {
    let prev = (id > 1).then(|| chapter_path(novel, id - 1));
    let text = format!("Text of chapter {}.", id);
    let html = chapter_page(&format!("Chapter {}", id), prev.as_deref(), &[text.as_str()]);

    Mock::given(method("GET"))
        .and(path(chapter_path(novel, id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

/// Serves the novel detail page and its cover image
pub async fn mount_novel(server: &MockServer, novel: &str, expected_fetches: u64) {
    let html = format!(
        r#"<html><body>
        <div class="books">
          <img src="/covers/{novel}.jpg" alt="cover">
          <h3 class="title">My Novel</h3>
        </div>
        <div class="desc-text">A story.</div>
        </body></html>"#
    );

    Mock::given(method("GET"))
        .and(path(format!("/{}.html", novel)))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(expected_fetches)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/covers/{}.jpg", novel)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"\xff\xd8jpeg".to_vec())
                .insert_header("content-type", "image/jpeg"),
        )
        .expect(expected_fetches)
        .mount(server)
        .await;
}

/// One listing row: `(novel href, chapter href)`, either may be absent
pub type Row<'a> = (Option<&'a str>, Option<&'a str>);

pub fn listing_page(rows: &[Row<'_>]) -> String {
    let rows: String = rows
        .iter()
        .map(|(novel, chapter)| {
            let novel = novel
                .map(|href| format!(r#"<h3 class="truyen-title"><a href="{}">Novel</a></h3>"#, href))
                .unwrap_or_default();
            let chapter = match chapter {
                Some(href) => format!(r#"<a href="{}"><span>Latest</span></a>"#, href),
                None => "<span>Latest</span>".to_string(),
            };
            format!(
                r#"<div class="row">{}<div class="text-info">{}</div></div>"#,
                novel, chapter
            )
        })
        .collect();

    format!(
        r#"<html><body><div class="col-truyen-main">{}</div></body></html>"#,
        rows
    )
}

pub async fn mount_listing(server: &MockServer, page: u32, rows: &[Row<'_>]) {
    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(rows)))
        .expect(1)
        .mount(server)
        .await;
}

/// Stores chapters `1..=last` of `novel`, already numbered
pub fn seed_chapters(store: &mut SqliteStorage, novel: &str, last: u32) {
    for id in 1..=last {
        let prev = (id > 1).then(|| chapter_path(novel, id - 1));
        let mut chapter = Chapter::unnumbered(
            novel,
            &id.to_string(),
            format!("Chapter {}", id),
            format!("\nText of chapter {}.", id),
            prev,
        );
        chapter.number = ChapterNumber::Assigned(id);
        store.put_chapter(&chapter).unwrap();
    }
}

/// Assigned number of every stored chapter, by numeric chapter id
pub fn numbers(store: &SqliteStorage, novel: &str) -> Vec<(u32, ChapterNumber)> {
    let mut numbers: Vec<(u32, ChapterNumber)> = store
        .known_chapters(novel)
        .unwrap()
        .into_iter()
        .map(|(id, number)| (id.parse().unwrap(), number))
        .collect();
    numbers.sort_by_key(|(id, _)| *id);
    numbers
}

pub fn assigned(range: std::ops::RangeInclusive<u32>) -> Vec<(u32, ChapterNumber)> {
    range.map(|n| (n, ChapterNumber::Assigned(n))).collect()
}
