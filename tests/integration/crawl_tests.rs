//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the upstream API and a SQLite
//! store on disk, and run whole ticks end-to-end.

use chrono::{Duration, Utc};
use discovery_crawler::catalog::{build_http_client, HttpCatalog};
use discovery_crawler::config::{parse_config, Config};
use discovery_crawler::credentials::{ClientCredentials, CredentialManager};
use discovery_crawler::crawler::{Coordinator, SessionOutcome};
use discovery_crawler::query::{Corpus, QueryTermGenerator};
use discovery_crawler::selection::{CandidateSelector, GenreLinks};
use discovery_crawler::session::{FilterSet, Session, DEFAULT_SESSION_ID};
use discovery_crawler::storage::{SessionStore, SqliteSessionStore};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Setup {
    _dir: TempDir,
    server: MockServer,
    store: Arc<SqliteSessionStore>,
    coordinator: Coordinator,
}

fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    let toml = format!(
        r#"
[crawler]
picks-per-search = 5
rate-limit-backoff-secs = 30

[default-pool]
capacity = 200

[upstream]
api-base-url = "{uri}/v1"
token-url = "{uri}/api/token"

[store]
database-path = "{db}"

[credentials]
token-cache-path = "{token}"
"#,
        uri = server.uri(),
        db = dir.path().join("store.db").display(),
        token = dir.path().join("access-token").display(),
    );
    parse_config(&toml).expect("valid test config")
}

async fn setup() -> Setup {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let client = build_http_client(&config.upstream).unwrap();
    let credentials = Arc::new(CredentialManager::new(
        client.clone(),
        config.upstream.token_url.as_str(),
        ClientCredentials::new("id", "secret"),
        &config.credentials,
    ));
    let catalog = HttpCatalog::new(client, &config.upstream.api_base_url, credentials);

    let store = Arc::new(
        SqliteSessionStore::new(std::path::Path::new(&config.store.database_path)).unwrap(),
    );

    let coordinator = Coordinator::new(
        &config,
        store.clone(),
        Arc::new(catalog),
        CandidateSelector::new(config.crawler.picks_per_search, GenreLinks::default()),
        QueryTermGenerator::with_seed(Corpus::builtin(), 3),
    )
    .with_seed(5);

    Setup {
        _dir: dir,
        server,
        store,
        coordinator,
    }
}

/// 50 tracks across 8 lead artists
fn search_body() -> serde_json::Value {
    let items: Vec<_> = (0..50)
        .map(|i| {
            let artist = format!("ar{}", i % 8);
            json!({
                "id": format!("t{}", i),
                "name": format!("Song {}", i),
                "popularity": (i * 2) as u8,
                "preview_url": format!("https://preview.example/{}", i),
                "external_urls": { "spotify": format!("https://open.example/track/t{}", i) },
                "album": {
                    "name": "Record",
                    "release_date": "1984",
                    "images": [{ "url": format!("https://img.example/{}.jpg", i) }],
                    "external_urls": {}
                },
                "artists": [{ "id": artist, "name": artist, "external_urls": {} }]
            })
        })
        .collect();
    json!({ "tracks": { "items": items } })
}

fn artists_body() -> serde_json::Value {
    let artists: Vec<_> = (0..8)
        .map(|i| json!({ "id": format!("ar{}", i), "genres": [format!("style-{}", i % 3)] }))
        .collect();
    json!({ "artists": artists })
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/artists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(artists_body()))
        .mount(server)
        .await;
}

fn drain(store: &SqliteSessionStore, id: &str) -> Vec<discovery_crawler::selection::CatalogItem> {
    let mut items = Vec::new();
    while let Some(item) = store.cache_pop(id).unwrap() {
        items.push(item);
    }
    items
}

#[tokio::test]
async fn test_tick_fills_new_session() {
    let mut s = setup().await;
    mount_catalog(&s.server).await;

    s.store
        .upsert_session(&Session::new("fresh", None).with_capacity(10).with_term_length(5))
        .unwrap();

    let report = s.coordinator.tick().await.unwrap();
    assert!(!report.rate_limited);

    let items = drain(&s.store, "fresh");
    assert!(!items.is_empty() && items.len() <= 5);

    let leads: HashSet<_> = items.iter().map(|i| i.lead_artist_id().unwrap()).collect();
    assert_eq!(leads.len(), items.len());
    for item in &items {
        assert_eq!(item.genres.len(), 1);
        assert!(item.genres[0].name.starts_with("style-"));
    }

    // The default pool was searched in the same tick
    assert!(matches!(
        report.outcome(DEFAULT_SESSION_ID),
        Some(SessionOutcome::Committed { .. })
    ));
}

#[tokio::test]
async fn test_popularity_filter_and_term_growth() {
    let mut s = setup().await;
    mount_catalog(&s.server).await;

    // Only tracks with popularity 80..=98 qualify (t40..t49, all 8 artists)
    let filters = FilterSet::default().with_popularity_range(80, 100);
    s.store
        .upsert_session(&Session::new("popular", Some(filters)).with_term_length(4))
        .unwrap();

    s.coordinator.tick().await.unwrap();

    let items = drain(&s.store, "popular");
    assert_eq!(items.len(), 5);
    assert!(items.iter().all(|i| i.popularity >= 80));
    assert_eq!(s.store.get_session("popular").unwrap().unwrap().term_length, 5);
}

#[tokio::test]
async fn test_expired_session_is_removed() {
    let mut s = setup().await;
    mount_catalog(&s.server).await;

    let stale = Session::new("stale", None).with_last_seen_at(Utc::now() - Duration::minutes(11));
    s.store.upsert_session(&stale).unwrap();
    s.store
        .upsert_session(&Session::new("recent", None).with_last_seen_at(Utc::now() - Duration::minutes(9)))
        .unwrap();

    let report = s.coordinator.tick().await.unwrap();

    assert_eq!(report.expired, vec!["stale".to_string()]);
    assert!(s.store.get_session("stale").unwrap().is_none());
    assert_eq!(s.store.cache_count("stale").unwrap(), 0);
    assert!(s.store.get_session("recent").unwrap().is_some());
    assert!(s.store.cache_count("recent").unwrap() > 0);
}

#[tokio::test]
async fn test_rate_limited_tick_writes_nothing() {
    let mut s = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
        .mount(&s.server)
        .await;

    s.store.upsert_session(&Session::new("waiting", None)).unwrap();

    let report = s.coordinator.tick().await.unwrap();

    assert!(report.rate_limited);
    assert_eq!(report.retry_after, Some(12));
    assert_eq!(s.store.cache_count("waiting").unwrap(), 0);
    assert_eq!(s.store.cache_count(DEFAULT_SESSION_ID).unwrap(), 0);
    assert_eq!(
        s.coordinator.next_pause(&report),
        std::time::Duration::from_secs(30)
    );
}

#[tokio::test]
async fn test_full_session_is_not_searched_again() {
    let mut s = setup().await;
    mount_catalog(&s.server).await;

    s.store
        .upsert_session(&Session::new("small", None).with_capacity(3))
        .unwrap();

    let first = s.coordinator.tick().await.unwrap();
    assert!(matches!(
        first.outcome("small"),
        Some(SessionOutcome::Committed { .. })
    ));
    // One search may overshoot the capacity observed at tick start
    let after_first = s.store.cache_count("small").unwrap();
    assert!(after_first >= 3);

    let second = s.coordinator.tick().await.unwrap();
    assert!(second.full.contains(&"small".to_string()));
    assert!(second.outcome("small").is_none());
    assert_eq!(s.store.cache_count("small").unwrap(), after_first);
}
