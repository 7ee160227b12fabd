//! Crawler module for forum scanning
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded retry
//! - Listing and topic page extraction
//! - Link categorization of post bodies
//! - Global pacing and overall scan coordination

mod coordinator;
mod fetcher;
mod links;
mod pacer;
mod parser;

pub use coordinator::{
    Claim, Coordinator, CrawlOptions, InFlight, NOTE_ANALYZED, NOTE_UNAVAILABLE,
};
pub use fetcher::{
    backoff_delay, build_http_client, FetchResult, Fetcher, Sleeper, TokioSleeper,
    FIXED_RETRY_DELAY,
};
pub use links::{categorize, classify_links, LinkCategories, LinkCategory};
pub use pacer::Pacer;
pub use parser::{
    parse_listing, parse_post, topic_id, ExtractedPost, TopicLink, UNKNOWN_AUTHOR, UNKNOWN_TITLE,
};

use crate::classifier::OllamaClassifier;
use crate::config::Config;
use crate::state::CrawlStats;
use crate::storage::Storage;
use crate::TalkscanError;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Wires a coordinator from configuration
///
/// Fails only if an HTTP client cannot be built.
pub fn build_coordinator<S: Storage>(
    config: &Config,
    storage: Arc<Mutex<S>>,
) -> Result<Coordinator<S>, TalkscanError> {
    let client = build_http_client(&config.user_agent, config.crawler.request_timeout_secs)?;
    let classifier = OllamaClassifier::new(config.classifier.clone())?;

    Ok(Coordinator::new(
        CrawlOptions::from_config(config),
        storage,
        Arc::new(classifier),
        Fetcher::new(client),
    ))
}

/// Runs a complete section scan
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP and classification clients
/// 2. Fetch each configured listing page
/// 3. Analyze and store every topic not already in the store
///
/// # Example
///
/// ```no_run
/// use talkscan::config::load_config;
/// use talkscan::crawler::crawl;
/// use talkscan::storage::SqliteStorage;
/// use std::path::Path;
/// use std::sync::{Arc, Mutex};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("talkscan.toml"))?;
/// let storage = Arc::new(Mutex::new(SqliteStorage::new(Path::new(&config.output.database_path))?));
/// let stats = crawl(&config, storage, &CancellationToken::new()).await?;
/// println!("{} items processed", stats.processed);
/// # Ok(())
/// # }
/// ```
pub async fn crawl<S: Storage>(
    config: &Config,
    storage: Arc<Mutex<S>>,
    cancel: &CancellationToken,
) -> Result<CrawlStats, TalkscanError> {
    build_coordinator(config, storage)?.run(cancel).await
}
