use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Discovery-Crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "default-pool", default)]
    pub default_pool: DefaultPoolConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
}

/// Crawl loop behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Pause between ticks (milliseconds)
    #[serde(rename = "tick-interval-ms")]
    pub tick_interval_ms: u64,

    /// Pause after the upstream signals rate limiting (seconds)
    #[serde(rename = "rate-limit-backoff-secs")]
    pub rate_limit_backoff_secs: u64,

    /// Sessions not seen for longer than this are deleted (minutes)
    #[serde(rename = "session-expiry-minutes")]
    pub session_expiry_minutes: u64,

    /// Maximum number of items picked from one search
    #[serde(rename = "picks-per-search")]
    pub picks_per_search: usize,

    /// Number of tracks requested per search
    #[serde(rename = "search-limit")]
    pub search_limit: u32,

    /// Maximum number of session pipelines in flight during a tick
    #[serde(rename = "max-concurrent-sessions")]
    pub max_concurrent_sessions: usize,
}

impl CrawlerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_secs(self.rate_limit_backoff_secs)
    }

    pub fn session_expiry(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_expiry_minutes as i64)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            rate_limit_backoff_secs: 60,
            session_expiry_minutes: 10,
            picks_per_search: 5,
            search_limit: 50,
            max_concurrent_sessions: 8,
        }
    }
}

/// Settings for the unfiltered shared pool
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultPoolConfig {
    /// Maximum number of cached items in the shared pool
    pub capacity: u64,

    /// Starting query term length for the shared pool
    #[serde(rename = "term-length")]
    pub term_length: u32,
}

impl Default for DefaultPoolConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            term_length: 5,
        }
    }
}

/// Upstream catalog API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the catalog Web API (search and artists endpoints)
    #[serde(rename = "api-base-url")]
    pub api_base_url: String,

    /// Client-credentials token endpoint
    #[serde(rename = "token-url")]
    pub token_url: String,

    /// User agent sent with every upstream request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.spotify.com/v1".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            user_agent: format!("discovery-crawler/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
        }
    }
}

/// Shared store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database shared with the request layer
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: "./discovery.db".to_string(),
        }
    }
}

/// Bearer credential handling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// File the current access token is persisted to
    #[serde(rename = "token-cache-path")]
    pub token_cache_path: String,

    /// Tokens are treated as expired this many seconds early
    #[serde(rename = "expiry-margin-secs")]
    pub expiry_margin_secs: u64,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            token_cache_path: "./access-token".to_string(),
            expiry_margin_secs: 60,
        }
    }
}

/// Word lists and genre links used to build and enrich results
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Newline-separated list of names (built-in list when unset)
    #[serde(rename = "names-path")]
    pub names_path: Option<String>,

    /// Newline-separated list of common words (built-in list when unset)
    #[serde(rename = "words-path")]
    pub words_path: Option<String>,

    /// JSON object mapping genre names to playlist ids
    #[serde(rename = "genre-playlists-path")]
    pub genre_playlists_path: Option<String>,

    /// Prefix joined with a playlist id to form a genre link
    #[serde(rename = "genre-playlist-base-url")]
    pub genre_playlist_base_url: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            names_path: None,
            words_path: None,
            genre_playlists_path: None,
            genre_playlist_base_url: "https://open.spotify.com/playlist/".to_string(),
        }
    }
}
