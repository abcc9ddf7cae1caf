use crate::config::CredentialsConfig;
use crate::credentials::{ClientCredentials, Credential, TokenCache};
use crate::{DiscoveryError, Result};
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

/// Body returned by the client-credentials token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Hands out a valid bearer credential, refreshing it when needed
///
/// The in-memory slot is guarded by an async mutex that stays locked for the
/// whole refresh, so concurrent callers never trigger more than one token
/// exchange at a time. Every refreshed credential is persisted to the
/// [`TokenCache`] so it survives restarts.
pub struct CredentialManager {
    client: Client,
    token_url: String,
    client_credentials: ClientCredentials,
    cache: TokenCache,
    expiry_margin: Duration,
    current: Mutex<Option<Credential>>,
}

impl CredentialManager {
    /// Creates a new credential manager
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for the token exchange
    /// * `token_url` - The client-credentials token endpoint
    /// * `client_credentials` - Client id and secret
    /// * `config` - Token cache location and expiry margin
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        client_credentials: ClientCredentials,
        config: &CredentialsConfig,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_credentials,
            cache: TokenCache::new(&config.token_cache_path),
            expiry_margin: Duration::seconds(config.expiry_margin_secs as i64),
            current: Mutex::new(None),
        }
    }

    /// Returns a credential that is valid right now
    ///
    /// Lookup order: the in-memory credential, then the token cache file,
    /// then a fresh exchange with the token endpoint.
    ///
    /// # Returns
    ///
    /// * `Ok(Credential)` - A credential valid for at least the expiry margin
    /// * `Err(DiscoveryError::UpstreamAuth)` - The token exchange failed
    pub async fn get(&self) -> Result<Credential> {
        let mut current = self.current.lock().await;
        let now = Utc::now();

        if let Some(credential) = current.as_ref() {
            if credential.is_valid_at(now, self.expiry_margin) {
                return Ok(credential.clone());
            }
        }

        if let Some(credential) = self.cache.load().await {
            if credential.is_valid_at(now, self.expiry_margin) {
                tracing::debug!("Reusing access token from {}", self.cache.path().display());
                *current = Some(credential.clone());
                return Ok(credential);
            }
        }

        let credential = self.exchange().await?;

        if let Err(e) = self.cache.store(&credential).await {
            tracing::warn!("Failed to persist access token: {}", e);
        }

        *current = Some(credential.clone());
        Ok(credential)
    }

    /// Forgets a credential the upstream rejected
    ///
    /// Only the credential carrying `rejected` is dropped. A late 401 for a
    /// token that has already been replaced leaves the fresh one alone. The
    /// cache file is cleared too when it still holds the rejected token,
    /// otherwise `get` would reload it.
    pub async fn invalidate(&self, rejected: &str) {
        let mut current = self.current.lock().await;

        match current.as_ref() {
            Some(credential) if credential.token != rejected => {
                tracing::debug!("Ignoring rejection of an already replaced access token");
                return;
            }
            Some(_) => {
                tracing::info!("Discarding rejected access token");
                *current = None;
            }
            None => {}
        }

        if let Some(cached) = self.cache.load().await {
            if cached.token != rejected {
                return;
            }
        }

        if let Err(e) = self.cache.clear().await {
            tracing::warn!("Failed to clear token cache: {}", e);
        }
    }

    /// Performs the client-credentials exchange
    async fn exchange(&self) -> Result<Credential> {
        tracing::info!("Requesting a new access token");

        let auth_error = |message: String| DiscoveryError::UpstreamAuth { message };

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_credentials.client_id.as_str()),
                ("client_secret", self.client_credentials.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| auth_error(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(auth_error(format!(
                "token endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| auth_error(format!("malformed token response: {}", e)))?;

        Ok(Credential::new(body.access_token, body.expires_in, Utc::now()))
    }
}
