use crate::config::types::{
    Config, CorpusConfig, CrawlerConfig, CredentialsConfig, DefaultPoolConfig, StoreConfig,
    UpstreamConfig,
};
use crate::ConfigError;
use url::Url;

/// One year
const MAX_SESSION_EXPIRY_MINUTES: u64 = 525_600;

/// One day
const MAX_EXPIRY_MARGIN_SECS: u64 = 86_400;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_default_pool(&config.default_pool)?;
    validate_upstream_config(&config.upstream)?;
    validate_store_config(&config.store)?;
    validate_credentials_config(&config.credentials)?;
    validate_corpus_config(&config.corpus)?;
    Ok(())
}

/// Validates crawl loop configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.tick_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "tick_interval_ms must be >= 10ms, got {}ms",
            config.tick_interval_ms
        )));
    }

    if config.session_expiry_minutes < 1
        || config.session_expiry_minutes > MAX_SESSION_EXPIRY_MINUTES
    {
        return Err(ConfigError::Validation(format!(
            "session_expiry_minutes must be between 1 and {}, got {}",
            MAX_SESSION_EXPIRY_MINUTES, config.session_expiry_minutes
        )));
    }

    if config.picks_per_search < 1 || config.picks_per_search > 50 {
        return Err(ConfigError::Validation(format!(
            "picks_per_search must be between 1 and 50, got {}",
            config.picks_per_search
        )));
    }

    // The search endpoint caps page size at 50
    if config.search_limit < 1 || config.search_limit > 50 {
        return Err(ConfigError::Validation(format!(
            "search_limit must be between 1 and 50, got {}",
            config.search_limit
        )));
    }

    if config.max_concurrent_sessions < 1 || config.max_concurrent_sessions > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sessions must be between 1 and 64, got {}",
            config.max_concurrent_sessions
        )));
    }

    Ok(())
}

fn validate_default_pool(config: &DefaultPoolConfig) -> Result<(), ConfigError> {
    if config.capacity < 1 {
        return Err(ConfigError::Validation(
            "default-pool capacity must be >= 1".to_string(),
        ));
    }

    if config.term_length < 1 {
        return Err(ConfigError::Validation(
            "default-pool term_length must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates upstream endpoints
fn validate_upstream_config(config: &UpstreamConfig) -> Result<(), ConfigError> {
    validate_http_url("api_base_url", &config.api_base_url)?;
    validate_http_url("token_url", &config.token_url)?;

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_credentials_config(config: &CredentialsConfig) -> Result<(), ConfigError> {
    if config.token_cache_path.is_empty() {
        return Err(ConfigError::Validation(
            "token_cache_path cannot be empty".to_string(),
        ));
    }

    if config.expiry_margin_secs > MAX_EXPIRY_MARGIN_SECS {
        return Err(ConfigError::Validation(format!(
            "expiry_margin_secs must be <= {}, got {}",
            MAX_EXPIRY_MARGIN_SECS, config.expiry_margin_secs
        )));
    }
    Ok(())
}

fn validate_corpus_config(config: &CorpusConfig) -> Result<(), ConfigError> {
    validate_http_url("genre_playlist_base_url", &config.genre_playlist_base_url)
}

/// Validates that a configured URL parses and uses an HTTP(S) scheme
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS",
            field, value
        )));
    }

    Ok(())
}
