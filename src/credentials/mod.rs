//! Upstream bearer credentials
//!
//! This module handles everything needed to authenticate against the catalog:
//! - Reading the client id and secret from the environment
//! - Exchanging them for a bearer token (client-credentials grant)
//! - Caching the token in memory and on disk until it expires

mod cache;
mod manager;

pub use cache::TokenCache;
pub use manager::CredentialManager;

use crate::ConfigError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable holding the upstream client id
pub const CLIENT_ID_VAR: &str = "CLIENT_ID";

/// Environment variable holding the upstream client secret
pub const CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";

/// A bearer token and the instant it stops being accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Creates a credential that expires `lifetime_secs` after `now`
    pub fn new(token: impl Into<String>, lifetime_secs: i64, now: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: now + Duration::seconds(lifetime_secs),
        }
    }

    /// Checks whether the credential can still be used at `now`
    ///
    /// `margin` is subtracted from the lifetime so a token is never sent
    /// moments before it expires.
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin < self.expires_at
    }
}

/// Client id and secret used for the token exchange
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Reads `CLIENT_ID` and `CLIENT_SECRET` from the process environment
    ///
    /// # Returns
    ///
    /// * `Ok(ClientCredentials)` - Both variables are set and non-empty
    /// * `Err(ConfigError::MissingCredentials)` - Either one is missing
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingCredentials(name))
        };

        Ok(Self {
            client_id: read(CLIENT_ID_VAR)?,
            client_secret: read(CLIENT_SECRET_VAR)?,
        })
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_credential_validity_uses_margin() {
        let now = Utc::now();
        let credential = Credential::new("abc", 3600, now);

        assert!(credential.is_valid_at(now, Duration::seconds(60)));
        assert!(!credential.is_valid_at(now + Duration::seconds(3550), Duration::seconds(60)));
        assert!(!credential.is_valid_at(now + Duration::seconds(3600), Duration::zero()));
    }

    #[test]
    fn test_client_credentials_from_lookup() {
        let env: HashMap<&str, &str> = [("CLIENT_ID", "id"), ("CLIENT_SECRET", "secret")].into();
        let creds = ClientCredentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.client_secret, "secret");
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let env: HashMap<&str, &str> = [("CLIENT_ID", "id"), ("CLIENT_SECRET", "  ")].into();
        let result = ClientCredentials::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert!(matches!(
            result,
            Err(ConfigError::MissingCredentials("CLIENT_SECRET"))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let creds = ClientCredentials::new("id", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
