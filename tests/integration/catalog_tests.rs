//! Integration tests for the upstream catalog client
//!
//! These tests use wiremock to stand in for the token endpoint and the
//! catalog Web API.

use discovery_crawler::catalog::{build_http_client, CatalogApi, HttpCatalog, SearchQuery};
use discovery_crawler::config::{CredentialsConfig, UpstreamConfig};
use discovery_crawler::credentials::{ClientCredentials, CredentialManager, TokenCache};
use discovery_crawler::session::FilterSet;
use discovery_crawler::DiscoveryError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials_config(dir: &TempDir) -> CredentialsConfig {
    CredentialsConfig {
        token_cache_path: dir.path().join("access-token").display().to_string(),
        expiry_margin_secs: 60,
    }
}

fn manager(server: &MockServer, dir: &TempDir) -> CredentialManager {
    CredentialManager::new(
        build_http_client(&UpstreamConfig::default()).expect("client"),
        format!("{}/api/token", server.uri()),
        ClientCredentials::new("my-id", "my-secret"),
        &credentials_config(dir),
    )
}

fn catalog(server: &MockServer, dir: &TempDir) -> HttpCatalog {
    HttpCatalog::new(
        build_http_client(&UpstreamConfig::default()).expect("client"),
        &format!("{}/v1", server.uri()),
        Arc::new(manager(server, dir)),
    )
}

async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=my-id"))
        .and(body_string_contains("client_secret=my-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn track_json(id: &str, artist: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Song {}", id),
        "popularity": 42,
        "preview_url": null,
        "external_urls": { "spotify": format!("https://open.example/track/{}", id) },
        "album": {
            "name": "Record",
            "release_date": "1977-09-23",
            "images": [{ "url": "https://img.example/cover.jpg", "height": 640, "width": 640 }],
            "external_urls": { "spotify": "https://open.example/album/1" }
        },
        "artists": [{
            "id": artist,
            "name": format!("Artist {}", artist),
            "external_urls": { "spotify": format!("https://open.example/artist/{}", artist) }
        }]
    })
}

fn plain_query(term: &str) -> SearchQuery {
    let mut rng = StdRng::seed_from_u64(0);
    SearchQuery::build(term.to_string(), &FilterSet::default(), 50, &mut rng)
}

#[tokio::test]
async fn test_token_exchange_is_persisted() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_token(&server, "tok-1", 1).await;

    let credential = manager(&server, &dir).get().await.unwrap();
    assert_eq!(credential.token, "tok-1");

    let cached = TokenCache::new(dir.path().join("access-token"))
        .load()
        .await
        .expect("token cache written");
    assert_eq!(cached, credential);
}

#[tokio::test]
async fn test_cached_token_survives_restart() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_token(&server, "tok-1", 1).await;

    let first = manager(&server, &dir).get().await.unwrap();
    // A fresh manager stands in for a restarted process
    let second = manager(&server, &dir).get().await.unwrap();

    assert_eq!(first.token, second.token);
}

#[tokio::test]
async fn test_concurrent_gets_exchange_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_token(&server, "tok-1", 1).await;

    let manager = Arc::new(manager(&server, &dir));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().token, "tok-1");
    }
}

#[tokio::test]
async fn test_late_rejection_keeps_replacement_token() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    for token in ["tok-1", "tok-2"] {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token,
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
    }

    let manager = manager(&server, &dir);

    let old = manager.get().await.unwrap();
    assert_eq!(old.token, "tok-1");
    manager.invalidate(&old.token).await;

    let fresh = manager.get().await.unwrap();
    assert_eq!(fresh.token, "tok-2");

    // A second session's 401 for the old token arrives after the refresh
    manager.invalidate(&old.token).await;

    assert_eq!(manager.get().await.unwrap().token, "tok-2");
}

#[tokio::test]
async fn test_failed_exchange_is_auth_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let result = manager(&server, &dir).get().await;
    assert!(matches!(result, Err(DiscoveryError::UpstreamAuth { .. })));
}

#[tokio::test]
async fn test_search_sends_query_and_bearer() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "ab genre:\"jazz\" year:1970-1979"))
        .and(query_param("type", "track"))
        .and(query_param("limit", "50"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [track_json("t1", "a1"), null, track_json("t2", "a2")] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filters = FilterSet::default()
        .with_genre("jazz")
        .with_date_range(1970, 1979);
    let mut rng = StdRng::seed_from_u64(0);
    let query = SearchQuery::build("ab".to_string(), &filters, 50, &mut rng);

    let tracks = catalog(&server, &dir).search(&query).await.unwrap();

    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].lead_artist_id(), Some("a1"));
    assert_eq!(tracks[1].album.release_date, "1977-09-23");
}

#[tokio::test]
async fn test_artists_batch_lookup() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/artists"))
        .and(query_param("ids", "a1,a2,zz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": [
                { "id": "a1", "name": "One", "genres": ["soul", "funk"] },
                { "id": "a2", "name": "Two", "genres": [] },
                null
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids = vec!["a1".to_string(), "a2".to_string(), "zz".to_string()];
    let artists = catalog(&server, &dir).artists(&ids).await.unwrap();

    assert_eq!(artists.len(), 2);
    assert_eq!(artists[0].genres, vec!["soul", "funk"]);
    assert!(artists[1].genres.is_empty());
}

#[tokio::test]
async fn test_rate_limit_maps_to_rate_limited() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .mount(&server)
        .await;

    let result = catalog(&server, &dir).search(&plain_query("xy")).await;

    match result {
        Err(DiscoveryError::RateLimited { retry_after }) => assert_eq!(retry_after, Some(17)),
        other => panic!("expected rate limit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_forces_new_exchange() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_token(&server, "tok-1", 2).await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let catalog = catalog(&server, &dir);

    let first = catalog.search(&plain_query("xy")).await;
    assert!(matches!(first, Err(DiscoveryError::UpstreamAuth { .. })));

    // The rejected token is gone from memory and disk, so this exchanges again
    let second = catalog.search(&plain_query("xy")).await;
    assert!(matches!(second, Err(DiscoveryError::UpstreamAuth { .. })));
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/artists"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let catalog = catalog(&server, &dir);
    let search = catalog.search(&plain_query("xy")).await;
    let artists = catalog.artists(&["a1".to_string()]).await;

    assert!(matches!(search, Err(DiscoveryError::UpstreamTransient { .. })));
    assert!(matches!(artists, Err(DiscoveryError::UpstreamTransient { .. })));
}
