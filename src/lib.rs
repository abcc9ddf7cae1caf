//! Discovery-Crawler: a cache replenishment engine for catalog discovery
//!
//! This crate keeps a pool of discoverable catalog items filled per filter
//! session. It searches the upstream catalog with generated query terms,
//! picks artist-diverse candidates, enriches them with genre data, and writes
//! them into a shared session store that a request-serving layer drains.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod credentials;
pub mod output;
pub mod query;
pub mod selection;
pub mod session;
pub mod storage;

use thiserror::Error;

/// Main error type for Discovery-Crawler operations
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upstream authentication failed: {message}")]
    UpstreamAuth { message: String },

    #[error("Upstream rate limit hit (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("Upstream request to {url} failed: {message}")]
    UpstreamTransient { url: String, message: String },

    #[error("Search returned no results")]
    EmptyResult,

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiscoveryError {
    /// Returns true for the one condition that suspends a whole tick
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// The upstream's `Retry-After` hint, when it sent one with a rate limit
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Returns true for errors that must stop the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing {0} environment variable")]
    MissingCredentials(&'static str),
}

/// Result type alias for Discovery-Crawler operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::Coordinator;
pub use session::{FilterSet, Session, DEFAULT_SESSION_ID};
pub use storage::SessionStore;
