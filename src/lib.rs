//! Wordwatch: a front-page word-use tracker
//!
//! This crate visits a configured set of news front pages, follows the
//! article links found on them one level deep, counts a configured vocabulary
//! of terms, and appends a timestamped snapshot to each site's history.

pub mod config;
pub mod crawler;
pub mod output;
pub mod snapshot;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Wordwatch operations
#[derive(Debug, Error)]
pub enum WordwatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("No <article> blocks found on {url}")]
    StructureMismatch { url: String },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

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

    #[error("Site entry #{index}: {message}")]
    Site { index: usize, message: String },
}

/// Result type alias for Wordwatch operations
pub type Result<T> = std::result::Result<T, WordwatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, Site};
pub use crawler::{count_words, tokenize, WordDictionary};
pub use snapshot::{ArticleResult, CrawlSnapshot, PageSnapshot, SiteRecord};
pub use state::CrawlState;
