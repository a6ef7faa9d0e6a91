//! Integration tests for the HTTP fetcher
//!
//! These tests use wiremock to stand in for a MediaWiki installation and
//! exercise raw, render and parse requests, redirects, retries and the
//! SQLite response cache.

use std::sync::Arc;
use tempfile::TempDir;
use wikipediabase::config::{FetcherConfig, UserAgentConfig};
use wikipediabase::fetcher::{CachedFetcher, Fetcher, WikiFetcher};
use wikipediabase::storage::{ResponseStore, SqliteCache};
use wikipediabase::{FetchError, Symbol};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fetcher pointed at the mock wiki with fast retries
fn create_fetcher(server: &MockServer, retries: u32) -> WikiFetcher {
    let config = FetcherConfig {
        base_url: format!("{}/w/", server.uri()),
        timeout_secs: 5,
        retries,
        retry_delay_ms: 1,
        max_redirects: 4,
    };
    let user_agent = UserAgentConfig {
        client_name: "TestBase".to_string(),
        client_version: "0.1".to_string(),
        contact_url: "https://example.com/about".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    WikiFetcher::new(&config, &user_agent).expect("Failed to build fetcher")
}

/// Mounts a page served through `index.php?title=…&action=…`
async fn mount_page(server: &MockServer, title: &str, action: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .and(query_param("title", title))
        .and(query_param("action", action))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_raw_markup_and_rendered_page() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "Mount_Everest", "raw", "{{Infobox mountain\n| elevation_m = 8848\n}}").await;
    mount_page(&mock_server, "Mount_Everest", "render", "<p>Mount Everest is Earth's highest mountain.</p>").await;

    let fetcher = create_fetcher(&mock_server, 0);
    let symbol = Symbol::new("Mount Everest");

    let markup = fetcher.raw_markup(&symbol).await.unwrap();
    assert!(markup.contains("elevation_m = 8848"));

    let html = fetcher.html_source(&symbol).await.unwrap();
    assert!(html.starts_with("<p>Mount Everest"));
}

#[tokio::test]
async fn test_user_agent_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .and(wiremock::matchers::header(
            "user-agent",
            "TestBase/0.1 (+https://example.com/about; test@example.com)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("'''Batman'''"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(&mock_server, 0);
    fetcher.raw_markup(&Symbol::new("Batman")).await.unwrap();
}

#[tokio::test]
async fn test_missing_page_is_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(&mock_server, 3);
    let result = fetcher.raw_markup(&Symbol::new("Nowhere")).await;

    match result {
        Err(FetchError::NotFound { symbol }) => assert_eq!(symbol, "Nowhere"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "Black_Sea", "raw", "The '''Black Sea''' is a sea.").await;

    let fetcher = create_fetcher(&mock_server, 3);
    let markup = fetcher.raw_markup(&Symbol::new("Black Sea")).await.unwrap();
    assert_eq!(markup, "The '''Black Sea''' is a sea.");
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(&mock_server, 1);
    let result = fetcher.raw_markup(&Symbol::new("Black Sea")).await;
    assert!(matches!(result, Err(FetchError::Status { status: 500, .. })));
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(&mock_server, 3);
    let result = fetcher.raw_markup(&Symbol::new("Batman")).await;
    assert!(matches!(result, Err(FetchError::Status { status: 403, .. })));
}

#[tokio::test]
async fn test_redirects_followed() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "Obama", "raw", "#REDIRECT [[Barack Obama]]").await;
    mount_page(&mock_server, "Barack_Obama", "raw", "'''Barack Hussein Obama II''' is...").await;
    mount_page(&mock_server, "Barack_Obama", "render", "<p>Barack Hussein Obama II</p>").await;

    let fetcher = create_fetcher(&mock_server, 0);
    let symbol = Symbol::new("Obama");

    assert!(fetcher.markup_source(&symbol).await.unwrap().starts_with("'''Barack"));
    assert_eq!(
        fetcher.html_source(&symbol).await.unwrap(),
        "<p>Barack Hussein Obama II</p>"
    );
    assert_eq!(
        fetcher.redirect_url(&symbol).await.unwrap(),
        format!("{}/wiki/Barack_Obama", mock_server.uri())
    );
}

#[tokio::test]
async fn test_redirect_loop_detected() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "Ping", "raw", "#REDIRECT [[Pong]]").await;
    mount_page(&mock_server, "Pong", "raw", "#REDIRECT [[Ping]]").await;

    let fetcher = create_fetcher(&mock_server, 0);
    let result = fetcher.markup_source(&Symbol::new("Ping")).await;
    assert!(matches!(result, Err(FetchError::RedirectLoop { .. })));
}

#[tokio::test]
async fn test_render_through_parse_api() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=parse"))
        .and(body_string_contains("title=Template%3AInfobox+mountain"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"parse":{"title":"Template:Infobox mountain","text":{"*":"<table class=\"infobox\"><tr><th>Elevation</th><td>!!!!!elevation_m!!!!!</td></tr></table>"}}}"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(&mock_server, 0);
    let html = fetcher
        .render("{{Infobox mountain\n| elevation_m = !!!!!elevation_m!!!!!\n}}", Some("Template:Infobox mountain"))
        .await
        .unwrap();
    assert!(html.contains("<th>Elevation</th>"));
}

#[tokio::test]
async fn test_render_api_error_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"error":{"code":"invalidtitle","info":"Bad title"}}"#),
        )
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(&mock_server, 0);
    match fetcher.render("{{x}}", None).await {
        Err(FetchError::Decode { message, .. }) => assert_eq!(message, "invalidtitle: Bad title"),
        other => panic!("expected Decode, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cached_fetcher_persists_responses() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .and(query_param("title", "Batman"))
        .respond_with(ResponseTemplate::new(200).set_body_string("'''Batman''' is a superhero."))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cache.db");
    let symbol = Symbol::new("Batman");

    {
        let store = Arc::new(SqliteCache::open(&db_path).unwrap());
        let fetcher = CachedFetcher::new(create_fetcher(&mock_server, 0), store.clone());
        fetcher.raw_markup(&symbol).await.unwrap();
        fetcher.raw_markup(&symbol).await.unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    // A fresh process reads the same database instead of the wiki.
    let store = Arc::new(SqliteCache::open(&db_path).unwrap());
    let fetcher = CachedFetcher::new(create_fetcher(&mock_server, 0), store);
    assert_eq!(
        fetcher.raw_markup(&symbol).await.unwrap(),
        "'''Batman''' is a superhero."
    );
}

#[tokio::test]
async fn test_cached_fetcher_does_not_cache_failures() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let store = Arc::new(SqliteCache::in_memory().unwrap());
    let fetcher = CachedFetcher::new(create_fetcher(&mock_server, 0), store.clone());
    let symbol = Symbol::new("Nowhere");

    assert!(fetcher.raw_markup(&symbol).await.is_err());
    assert!(fetcher.raw_markup(&symbol).await.is_err());
    assert!(store.is_empty().unwrap());
}
