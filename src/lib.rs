//! Sumi-Seek: a resumable crawl-then-search engine
//!
//! This crate crawls pages reachable from a set of seed URLs, keeps a durable
//! crawl log that survives restarts, and answers free-text queries against an
//! inverted index rebuilt from that log.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod log;
pub mod output;
pub mod search;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Seek operations
#[derive(Debug, Error)]
pub enum SeekError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] log::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to load stopwords from {path}: {source}")]
    Stopwords {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Extraction worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Sumi-Seek operations
pub type Result<T> = std::result::Result<T, SeekError>;

// Re-export commonly used types
pub use config::Config;
pub use log::{CrawlLog, CrawlRecord, SqliteCrawlLog};
pub use search::{build, search, Document, InvertedIndex, SearchEngine, Tokenizer};
pub use state::VisitState;
pub use crate::url::{extract_host, normalize_url};
