//! Talkscan: a forum announcement scanner
//!
//! This crate crawls one section of a forum, extracts each announcement
//! topic, asks an external LLM to classify the post, and keeps a weighted
//! suitability score per topic in SQLite with an append-only audit trail.

pub mod classifier;
pub mod config;
pub mod crawler;
pub mod output;
pub mod scoring;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Talkscan operations
#[derive(Debug, Error)]
pub enum TalkscanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

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

/// Result type alias for Talkscan operations
pub type Result<T> = std::result::Result<T, TalkscanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use classifier::{Classification, Classifier, ClassifierOutcome, OllamaClassifier};
pub use config::Config;
pub use crawler::{classify_links, Coordinator, CrawlOptions, Fetcher, LinkCategories};
pub use scoring::{is_promising, score, PROMISING_THRESHOLD};
pub use state::{CrawlItem, CrawlStats, ItemLinks, ItemOutcome};
pub use storage::{ItemRecord, SqliteStorage, Storage};
