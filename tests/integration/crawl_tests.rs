//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl-then-search cycle end-to-end.

use std::path::{Path, PathBuf};
use sumi_seek::config::{Config, CrawlerConfig, SearchConfig, StorageConfig, UserAgentConfig};
use sumi_seek::crawler::{run_crawl, CrawlOutcome};
use sumi_seek::log::{export_csv, import_csv, open_log, CrawlLog, RunStatus};
use sumi_seek::{SearchEngine, Tokenizer};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from `seeds` into `db_path`
fn create_test_config(seeds: Vec<String>, db_path: &Path) -> Config {
    Config {
        seeds,
        crawler: CrawlerConfig {
            max_concurrent_extractions: 4,
            max_concurrent_per_host: 2,
            min_delay_ms: 0,
            max_delay_ms: 5, // Very short for testing
            request_timeout_secs: 5,
            idle_retries: 1,
            idle_backoff_ms: 10,
            shutdown_grace_secs: 5,
            max_pages: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        storage: StorageConfig {
            database_path: db_path.display().to_string(),
        },
        search: SearchConfig {
            stopwords_path: stopwords_path().display().to_string(),
        },
    }
}

fn stopwords_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("stopwords/english.txt")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

/// Mounts a three-page site: `/` links to `/page1` and `/page2`, which link
/// back to each other and to `/`
async fn mount_site(mock_server: &MockServer) {
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head><title>Home</title>
            <meta name="description" content="Welcome to the cat and dog shelter">
            </head><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2#top">Page 2</a>
            <a href="mailto:staff@example.com">Mail us</a>
            </body></html>"#,
            base_url
        )))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(
            r#"<html><head><title>Cats</title></head><body>
            <a href="/">Home</a>
            <a href="page2">Page 2</a>
            </body></html>"#
                .to_string(),
        ))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html(
            r#"<html><head>
            <meta name="description" content="Dogs and birds">
            </head><body><a href="/page1">Page 1</a></body></html>"#
                .to_string(),
        ))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let config = create_test_config(vec![format!("{}/", mock_server.uri())], &db_path);

    let summary = run_crawl(&config, "test-hash", std::future::pending())
        .await
        .expect("crawl failed");

    assert_eq!(summary.outcome, CrawlOutcome::Exhausted);
    assert_eq!(summary.recorded, 3);
    assert_eq!(summary.failed, 0);

    let log = open_log(&db_path).unwrap();
    let records = log.read_all().unwrap();
    assert_eq!(records.len(), 3);

    // Seed is recorded first, ids are dense
    assert_eq!(records[0].url, format!("{}/", mock_server.uri()));
    assert_eq!(records[0].title, "Home");
    assert_eq!(records[0].description, "Welcome to the cat and dog shelter");
    assert_eq!(
        records.iter().map(|r| r.sequence).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let page2 = records
        .iter()
        .find(|r| r.url.ends_with("/page2"))
        .expect("page2 recorded");
    assert_eq!(page2.title, "No Title");
    assert_eq!(page2.description, "Dogs and birds");

    let page1 = records.iter().find(|r| r.url.ends_with("/page1")).unwrap();
    assert_eq!(page1.description, "No Description");

    let run = log.latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(log.count_pending().unwrap(), 0);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let config = create_test_config(vec![format!("{}/", mock_server.uri())], &db_path);

    run_crawl(&config, "hash", std::future::pending()).await.unwrap();
    let first: Vec<_> = open_log(&db_path).unwrap().read_all().unwrap();

    let summary = run_crawl(&config, "hash", std::future::pending()).await.unwrap();

    assert_eq!(summary.outcome, CrawlOutcome::Idle);
    assert_eq!(summary.recorded, 0);

    let log = open_log(&db_path).unwrap();
    assert_eq!(log.read_all().unwrap(), first);
    assert_eq!(log.count_runs().unwrap(), 2);
}

#[tokio::test]
async fn test_failed_pages_are_marked_not_recorded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Index</title></head><body>
            <a href="/missing">Gone</a>
            <a href="/broken">Broken</a>
            <a href="/report.pdf">Report</a>
            </body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let config = create_test_config(vec![format!("{}/", base_url)], &db_path);

    let summary = run_crawl(&config, "hash", std::future::pending()).await.unwrap();

    assert_eq!(summary.recorded, 1);
    assert_eq!(summary.failed, 3);

    let log = open_log(&db_path).unwrap();
    assert_eq!(log.count_records().unwrap(), 1);
    assert_eq!(log.count_failed().unwrap(), 3);

    let visited = log.load_visited_set().unwrap();
    assert!(visited.contains(&format!("{}/missing", base_url)));
    assert!(visited.contains(&format!("{}/report.pdf", base_url)));
}

#[tokio::test]
async fn test_user_agent_header_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(html("<html><head><title>UA</title></head></html>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let config = create_test_config(vec![format!("{}/", mock_server.uri())], &db_path);

    let summary = run_crawl(&config, "hash", std::future::pending()).await.unwrap();
    assert_eq!(summary.recorded, 1);
}

#[tokio::test]
async fn test_page_budget_then_resume() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let mut config = create_test_config(vec![format!("{}/", mock_server.uri())], &db_path);
    config.crawler.max_pages = Some(1);

    let summary = run_crawl(&config, "hash", std::future::pending()).await.unwrap();
    assert_eq!(summary.outcome, CrawlOutcome::BudgetReached);
    assert_eq!(summary.recorded, 1);
    assert_eq!(open_log(&db_path).unwrap().count_pending().unwrap(), 2);

    // Resume without seeds: the pending frontier carries the crawl forward
    config.crawler.max_pages = None;
    config.seeds.clear();
    let summary = run_crawl(&config, "hash", std::future::pending()).await.unwrap();

    assert_eq!(summary.recorded, 2);
    assert_eq!(open_log(&db_path).unwrap().count_records().unwrap(), 3);
}

#[tokio::test]
async fn test_search_over_crawled_pages() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let config = create_test_config(vec![format!("{}/", mock_server.uri())], &db_path);
    run_crawl(&config, "hash", std::future::pending()).await.unwrap();

    let log = open_log(&db_path).unwrap();
    let tokenizer = Tokenizer::from_file(&stopwords_path()).unwrap();
    let engine = SearchEngine::from_log(&log, tokenizer).unwrap();

    // Home mentions both cat and dog; page2 mentions dogs, not dog
    let results = engine.search("the cat and dog");
    assert_eq!(results[0].document.title, "Home");
    assert_eq!(results[0].score, 2);

    let results = engine.search("birds");
    assert_eq!(results.len(), 1);
    assert!(results[0].document.url.ends_with("/page2"));

    assert!(engine.search("xyzzy").is_empty());
}

#[tokio::test]
async fn test_export_and_import_csv() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let config = create_test_config(vec![format!("{}/", mock_server.uri())], &db_path);
    run_crawl(&config, "hash", std::future::pending()).await.unwrap();

    let source = open_log(&db_path).unwrap();
    let csv_path = temp_dir.path().join("crawled_data.csv");
    assert_eq!(export_csv(&source, &csv_path).unwrap(), 3);

    let target = open_log(&temp_dir.path().join("imported.db")).unwrap();
    let summary = import_csv(&target, &csv_path).unwrap();
    assert_eq!(summary.imported, 3);

    let original: Vec<_> = source
        .read_all()
        .unwrap()
        .into_iter()
        .map(|r| (r.sequence, r.url, r.title, r.description))
        .collect();
    let imported: Vec<_> = target
        .read_all()
        .unwrap()
        .into_iter()
        .map(|r| (r.sequence, r.url, r.title, r.description))
        .collect();
    assert_eq!(original, imported);

    // Importing the same file again adds nothing
    let again = import_csv(&target, &csv_path).unwrap();
    assert_eq!(again.imported, 0);
    assert_eq!(again.duplicates, 3);
}
