//! Configuration module for Discovery-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file is a valid configuration. Upstream
//! client credentials are not part of the file; see [`crate::credentials`].
//!
//! # Example
//!
//! ```no_run
//! use discovery_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("discovery.toml")).unwrap();
//! println!("Sessions expire after {} minutes", config.crawler.session_expiry_minutes);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CorpusConfig, CrawlerConfig, CredentialsConfig, DefaultPoolConfig, StoreConfig,
    UpstreamConfig,
};

pub use parser::{config_hash, load_config, load_config_with_hash, parse_config};
