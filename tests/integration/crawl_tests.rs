//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use chrono::{Duration, Utc};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wordwatch::config::{
    resolve_sites, Config, CrawlerConfig, OutputConfig, SiteEntry, UserAgentConfig,
};
use wordwatch::crawler::{crawl, Coordinator, HttpTransport, SiteOutcome};
use wordwatch::output::PersistDecider;
use wordwatch::storage::{RunLog, RunStatus, SnapshotStore, SqliteStorage};
use wordwatch::SiteRecord;

/// Creates a test configuration with one site per URL
fn create_test_config(urls: &[String], dir: &TempDir) -> Config {
    Config {
        search_terms: vec!["corona".to_string(), "trump".to_string()],
        crawler: CrawlerConfig {
            politeness_delay_ms: 1, // Very short for testing
            request_timeout_secs: 5,
            include_articles: true,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: dir.path().join("wordwatch.db").display().to_string(),
            backup_dir: dir.path().join("backup").display().to_string(),
        },
        sites: urls
            .iter()
            .enumerate()
            .map(|(i, url)| SiteEntry {
                name: Some(format!("site{}", i)),
                url: Some(url.clone()),
                ..SiteEntry::default()
            })
            .collect(),
    }
}

fn coordinator(
    config: &Config,
    persist: PersistDecider,
) -> Coordinator<HttpTransport, SqliteStorage> {
    let transport = HttpTransport::from_config(&config.user_agent, &config.crawler)
        .expect("Failed to build transport");
    let storage = SqliteStorage::open_in_memory().expect("Failed to open storage");
    Coordinator::from_config(config, transport, storage, persist)
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

const FRONT_PAGE: &str = r#"<html><body>
    <nav>corona corona corona</nav>
    <article>
        <h2><a href="/a.html" title="Alpha">Corona news</a></h2>
    </article>
    <article>
        <p>Trump speaks</p>
    </article>
</body></html>"#;

const ARTICLE_A: &str = r#"<html><body>
    <article>
        Corona news about Trump and corona again.
        <a href="/b.html" title="Beta">more</a>
    </article>
</body></html>"#;

#[tokio::test]
async fn test_two_level_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", FRONT_PAGE).await;
    mount_page(&mock_server, "/a.html", ARTICLE_A).await;

    // Links found on article pages are never followed
    Mock::given(method("GET"))
        .and(path("/b.html"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[base_url.clone()], &dir);
    let mut coordinator = coordinator(&config, PersistDecider::always());

    let report = coordinator.run(resolve_sites(&config), "test_hash").await;

    assert!(matches!(
        report.outcome("site0"),
        Some(SiteOutcome::Completed {
            persisted: true,
            articles: 1,
            ..
        })
    ));

    let record = coordinator
        .store()
        .load_record("site0")
        .unwrap()
        .expect("site should be stored");
    assert_eq!(record.url, base_url);
    assert_eq!(record.data.len(), 1);

    let snapshot = &record.data[0];
    assert_eq!(snapshot.main_page.total_articles, Some(2));
    assert_eq!(snapshot.main_page.total_words.get("corona"), Some(1));
    assert_eq!(snapshot.main_page.total_words.get("trump"), Some(1));

    let articles = &snapshot.main_page_articles;
    assert_eq!(articles.total_articles, 1);
    assert_eq!(articles.total_words.get("corona"), Some(2));
    assert_eq!(articles.total_words.get("trump"), Some(1));

    let listed = articles.articles.as_ref().expect("articles should be listed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].article_name, "Alpha");
    assert_eq!(listed[0].article_link, format!("{}/a.html", base_url));
    assert_eq!(listed[0].total_words, articles.total_words);
}

#[tokio::test]
async fn test_backup_written_before_persistence() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", FRONT_PAGE).await;
    mount_page(&mock_server, "/a.html", ARTICLE_A).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[mock_server.uri()], &dir);
    let mut coordinator = coordinator(&config, PersistDecider::never());

    let report = coordinator.run(resolve_sites(&config), "test_hash").await;

    assert!(matches!(
        report.outcome("site0"),
        Some(SiteOutcome::Completed {
            persisted: false,
            backup: Some(_),
            ..
        })
    ));
    assert!(!coordinator.store().exists("site0").unwrap());

    let backup_path = dir.path().join("backup").join("site0_dump.json");
    let content = std::fs::read_to_string(&backup_path).expect("backup file should exist");
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();

    assert_eq!(json["_id"], "site0");
    assert_eq!(json["url"], mock_server.uri());
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["mainPage"]["totalArticles"], 2);
    assert_eq!(json["data"][0]["mainPageArticles"]["totalArticles"], 1);
    assert_eq!(
        json["data"][0]["mainPageArticles"]["articles"][0]["articleName"],
        "Alpha"
    );
}

#[tokio::test]
async fn test_missing_article_is_omitted() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        r#"<article><a href="/gone.html" title="Gone">x</a></article>
           <article><a href="/a.html" title="Alpha">x</a></article>"#,
    )
    .await;
    mount_page(&mock_server, "/a.html", ARTICLE_A).await;
    // "/gone.html" is not mounted, so wiremock answers 404

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[mock_server.uri()], &dir);
    let mut coordinator = coordinator(&config, PersistDecider::always());

    coordinator.run(resolve_sites(&config), "test_hash").await;

    let record = coordinator.store().load_record("site0").unwrap().unwrap();
    let articles = &record.data[0].main_page_articles;
    assert_eq!(record.data[0].main_page.total_articles, Some(2));
    assert_eq!(articles.total_articles, 1);
    assert_eq!(articles.articles.as_ref().unwrap()[0].article_name, "Alpha");
}

#[tokio::test]
async fn test_freshness_guard() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", FRONT_PAGE).await;
    mount_page(&mock_server, "/a.html", ARTICLE_A).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[mock_server.uri()], &dir);
    let site = resolve_sites(&config).remove(0).unwrap();

    // Crawled two hours ago: inside the three hour window
    let two_hours_ago = Utc::now() - Duration::hours(2);
    let mut recent = coordinator_with_record(
        &config,
        SiteRecord::new(&site.name, &site.url, two_hours_ago),
    );

    match recent.process_site(&site).await {
        SiteOutcome::Skipped { next_eligible } => {
            assert_eq!(next_eligible, two_hours_ago + Duration::hours(3));
        }
        other => panic!("expected skip, got {:?}", other),
    }
    assert_eq!(
        recent.store().get_updated_at(&site.name).unwrap(),
        Some(two_hours_ago)
    );

    // Crawled exactly three hours ago: due again
    let three_hours_ago = Utc::now() - Duration::hours(3);
    let mut due = coordinator_with_record(
        &config,
        SiteRecord::new(&site.name, &site.url, three_hours_ago),
    );

    assert!(matches!(
        due.process_site(&site).await,
        SiteOutcome::Completed {
            persisted: true,
            ..
        }
    ));
    assert!(due.store().get_updated_at(&site.name).unwrap().unwrap() > three_hours_ago);
}

#[tokio::test]
async fn test_front_page_without_articles_fails_only_that_site() {
    let broken = MockServer::start().await;
    mount_page(&broken, "/", "<html><body><p>corona</p></body></html>").await;

    let healthy = MockServer::start().await;
    mount_page(&healthy, "/", FRONT_PAGE).await;
    mount_page(&healthy, "/a.html", ARTICLE_A).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&[broken.uri(), healthy.uri()], &dir);
    config.sites.push(SiteEntry::default());
    let mut coordinator = coordinator(&config, PersistDecider::always());

    let report = coordinator.run(resolve_sites(&config), "test_hash").await;

    assert_eq!(report.sites.len(), 3);
    assert!(matches!(
        report.outcome("site0"),
        Some(SiteOutcome::Failed { .. })
    ));
    assert!(matches!(
        report.outcome("site1"),
        Some(SiteOutcome::Completed { .. })
    ));
    assert!(matches!(
        report.outcome("entry #2"),
        Some(SiteOutcome::Invalid { .. })
    ));
    assert!(!coordinator.store().exists("site0").unwrap());
}

#[tokio::test]
async fn test_crawl_entry_point_records_run() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", FRONT_PAGE).await;
    mount_page(&mock_server, "/a.html", ARTICLE_A).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[mock_server.uri()], &dir);
    let db_path = dir.path().join("wordwatch.db");

    let report = crawl(config.clone(), "abc123", PersistDecider::always())
        .await
        .expect("crawl should succeed");
    assert_eq!(report.completed(), 1);

    // A second pass right away is skipped by the freshness guard
    let report = crawl(config, "abc123", PersistDecider::always())
        .await
        .expect("crawl should succeed");
    assert_eq!(report.skipped(), 1);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "abc123");
    assert_eq!(storage.load_record("site0").unwrap().unwrap().data.len(), 1);
}

/// Builds a coordinator whose store already holds `record`
fn coordinator_with_record(
    config: &Config,
    record: SiteRecord,
) -> Coordinator<HttpTransport, SqliteStorage> {
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    storage.create(&record).unwrap();
    let transport = HttpTransport::from_config(&config.user_agent, &config.crawler).unwrap();
    Coordinator::from_config(config, transport, storage, PersistDecider::always())
}
