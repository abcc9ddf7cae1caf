//! On-disk token cache
//!
//! Persists the most recent credential so a restarted crawler can reuse it
//! until it expires instead of performing a fresh exchange.

use crate::credentials::Credential;
use crate::Result;
use std::path::{Path, PathBuf};

/// JSON file holding the last issued credential
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached credential, if any
    ///
    /// A missing file yields `None`. An unreadable or corrupt file is logged
    /// and also yields `None`, so a bad cache only costs one token exchange.
    pub async fn load(&self) -> Option<Credential> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read token cache {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::warn!("Ignoring corrupt token cache {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Writes the credential, replacing any previous one
    pub async fn store(&self, credential: &Credential) -> Result<()> {
        let json = serde_json::to_string(credential)?;
        tokio::fs::write(&self.path, json).await?;
        tracing::debug!("Cached access token in {}", self.path.display());
        Ok(())
    }

    /// Removes the cached credential; a missing file is not an error
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
