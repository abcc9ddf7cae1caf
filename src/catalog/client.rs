//! HTTP access to the upstream catalog
//!
//! This module handles all catalog requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Bearer authentication through the [`CredentialManager`]
//! - Mapping upstream status codes onto the crate's error taxonomy

use crate::catalog::query::SearchQuery;
use crate::catalog::types::{ArtistDetails, ArtistsResponse, SearchResponse, Track};
use crate::config::UpstreamConfig;
use crate::credentials::CredentialManager;
use crate::{DiscoveryError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// The catalog operations the crawler depends on
///
/// # Errors
///
/// | Condition | Error |
/// |-----------|-------|
/// | HTTP 429 | `RateLimited` |
/// | HTTP 401 / token exchange failure | `UpstreamAuth` |
/// | Other non-2xx, network, decode | `UpstreamTransient` |
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Runs a track search
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Track>>;

    /// Looks up genre tags for a batch of artist ids
    ///
    /// Unknown ids are omitted from the result.
    async fn artists(&self, ids: &[String]) -> Result<Vec<ArtistDetails>>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The upstream configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &UpstreamConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`CatalogApi`] over the upstream Web API
pub struct HttpCatalog {
    client: Client,
    base_url: String,
    credentials: Arc<CredentialManager>,
}

impl HttpCatalog {
    /// Creates a catalog client
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `base_url` - API root, e.g. `https://api.spotify.com/v1`
    /// * `credentials` - Source of bearer tokens
    pub fn new(client: Client, base_url: &str, credentials: Arc<CredentialManager>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn endpoint<I, K, V>(&self, path: &str, params: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(Url::parse_with_params(
            &format!("{}/{}", self.base_url, path),
            params,
        )?)
    }

    /// Sends an authenticated GET and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let credential = self.credentials.get().await?;
        tracing::debug!("Requesting {}", url);

        let transient = |message: String| DiscoveryError::UpstreamTransient {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&credential.token)
            .send()
            .await
            .map_err(|e| transient(classify_send_error(&e)))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(DiscoveryError::RateLimited { retry_after });
        }

        if status == StatusCode::UNAUTHORIZED {
            self.credentials.invalidate(&credential.token).await;
            return Err(DiscoveryError::UpstreamAuth {
                message: format!("{} rejected the access token", url),
            });
        }

        if !status.is_success() {
            return Err(transient(format!("HTTP {}", status.as_u16())));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| transient(format!("malformed response: {}", e)))
    }
}

fn classify_send_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    }
}

#[async_trait]
impl CatalogApi for HttpCatalog {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Track>> {
        let url = self.endpoint("search", query.params())?;
        let response: SearchResponse = self.get_json(url).await?;
        Ok(response.tracks.into_tracks())
    }

    async fn artists(&self, ids: &[String]) -> Result<Vec<ArtistDetails>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint("artists", [("ids", ids.join(","))])?;
        let response: ArtistsResponse = self.get_json(url).await?;
        Ok(response.artists.into_iter().flatten().collect())
    }
}
