//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the section scan that coordinates all aspects of
//! the crawling process, including:
//! - Fetching listing pages and extracting topic links
//! - Skipping topics already in the store
//! - Running the per-topic pipeline on a bounded worker pool
//! - Pacing, cancellation and per-topic outcome tallies

use crate::classifier::Classifier;
use crate::config::Config;
use crate::crawler::links::classify_links;
use crate::crawler::pacer::Pacer;
use crate::crawler::parser::{parse_listing, parse_post, ExtractedPost, TopicLink};
use crate::crawler::{FetchResult, Fetcher};
use crate::state::{excerpt, CrawlItem, CrawlStats, ItemOutcome};
use crate::storage::{Storage, StorageError, StorageResult};
use crate::TalkscanError;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use url::Url;

/// History note for an item whose classification was parsed
pub const NOTE_ANALYZED: &str = "initial analysis";

/// History note for an item stored with the default classification
pub const NOTE_UNAVAILABLE: &str = "classification unavailable";

/// What to scan and how hard to try
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    pub base_url: String,
    pub section_id: u32,
    pub pages: u32,
    pub page_size: u32,
    pub max_retries: u32,
    pub pace_millis: u64,
    pub workers: usize,
}

impl CrawlOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.forum.base_url.clone(),
            section_id: config.forum.section_id,
            pages: config.forum.pages,
            page_size: config.forum.page_size,
            max_retries: config.crawler.max_retries,
            pace_millis: config.crawler.pace_millis,
            workers: config.crawler.workers.max(1) as usize,
        }
    }

    /// URL of listing page `page` (0-based) of the configured section
    pub fn listing_url(&self, page: u32) -> Result<Url, TalkscanError> {
        let offset = u64::from(page) * u64::from(self.page_size);
        let url = format!(
            "{}/index.php?board={}.{}",
            self.base_url.trim_end_matches('/'),
            self.section_id,
            offset
        );
        Ok(Url::parse(&url)?)
    }
}

/// Topic ids currently held by a worker
#[derive(Debug, Default)]
pub struct InFlight {
    ids: Mutex<HashSet<i64>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `id`, or returns None if another worker holds it
    ///
    /// The claim is released when the returned guard is dropped.
    pub fn try_claim(&self, id: i64) -> Option<Claim<'_>> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        if ids.insert(id) {
            Some(Claim { owner: self, id })
        } else {
            None
        }
    }

    pub fn is_claimed(&self, id: i64) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

/// Exclusive hold on one topic id
#[derive(Debug)]
pub struct Claim<'a> {
    owner: &'a InFlight,
    id: i64,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut ids = self
            .owner
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        ids.remove(&self.id);
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<S: Storage> {
    options: CrawlOptions,
    storage: Arc<Mutex<S>>,
    classifier: Arc<dyn Classifier>,
    fetcher: Fetcher,
    pacer: Pacer,
    in_flight: InFlight,
}

impl<S: Storage> Coordinator<S> {
    pub fn new(
        options: CrawlOptions,
        storage: Arc<Mutex<S>>,
        classifier: Arc<dyn Classifier>,
        fetcher: Fetcher,
    ) -> Self {
        let pacer = Pacer::from_millis(options.pace_millis);
        Self {
            options,
            storage,
            classifier,
            fetcher,
            pacer,
            in_flight: InFlight::new(),
        }
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    pub fn storage(&self) -> Arc<Mutex<S>> {
        self.storage.clone()
    }

    /// Scans every configured listing page of the section
    ///
    /// Individual topic failures are tallied, never returned. The only
    /// error is a listing URL that cannot be built from the base URL.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<CrawlStats, TalkscanError> {
        let mut stats = CrawlStats::default();

        tracing::info!(
            "Scanning section {} ({} pages, {} workers)",
            self.options.section_id,
            self.options.pages,
            self.options.workers
        );

        for page in 0..self.options.pages {
            if cancel.is_cancelled() {
                tracing::info!("Crawl cancelled before page {}", page);
                break;
            }

            let listing_url = self.options.listing_url(page)?;

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Crawl cancelled before page {}", page);
                    break;
                }
                _ = self.pacer.wait() => {}
            }
            tracing::info!("Fetching listing page {}: {}", page, listing_url);

            let html = match self
                .fetcher
                .fetch(listing_url.as_str(), self.options.max_retries)
                .await
            {
                FetchResult::Content(html) => html,
                FetchResult::Unavailable {
                    attempts,
                    last_error,
                } => {
                    tracing::warn!(
                        "Listing page {} unavailable after {} attempts: {}",
                        page,
                        attempts,
                        last_error
                    );
                    stats.pages_unavailable += 1;
                    continue;
                }
            };
            stats.pages_scanned += 1;

            let topics = parse_listing(&html, &listing_url);
            tracing::info!("Found {} new topics on page {}", topics.len(), page);

            let outcomes: Vec<ItemOutcome> = stream::iter(topics)
                .map(|topic| self.process_topic(topic, cancel))
                .buffer_unordered(self.options.workers)
                .collect()
                .await;

            for outcome in outcomes {
                stats.record(outcome);
            }
        }

        tracing::info!(
            "Section scan finished: {} processed, {} promising, {} skipped, {} failed",
            stats.processed,
            stats.promising,
            stats.skipped,
            stats.failures()
        );

        Ok(stats)
    }

    /// Runs the pipeline for one topic unless it is known or claimed
    pub async fn process_topic(&self, topic: TopicLink, cancel: &CancellationToken) -> ItemOutcome {
        if cancel.is_cancelled() {
            return ItemOutcome::Cancelled;
        }

        let Some(_claim) = self.in_flight.try_claim(topic.id) else {
            tracing::debug!("Topic {} is being processed by another worker", topic.id);
            return ItemOutcome::InProgress;
        };

        match self.with_storage(|s| s.exists(topic.id)) {
            Ok(true) => {
                tracing::debug!("Topic {} already analyzed, skipping", topic.id);
                return ItemOutcome::Skipped;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Failed to look up topic {}: {}", topic.id, e);
                return ItemOutcome::StoreFailed;
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return ItemOutcome::Cancelled,
            _ = self.pacer.wait() => {}
        }

        self.process_item(topic, cancel).await
    }

    /// fetch → extract → classify → score → store
    async fn process_item(&self, topic: TopicLink, cancel: &CancellationToken) -> ItemOutcome {
        tracing::info!("Analyzing topic {}", topic.id);

        let fetch = tokio::select! {
            _ = cancel.cancelled() => return ItemOutcome::Cancelled,
            result = self.fetcher.fetch(&topic.url, self.options.max_retries) => result,
        };

        let fetched_at = Utc::now();
        let html = match fetch {
            FetchResult::Content(html) => html,
            FetchResult::Unavailable {
                attempts,
                last_error,
            } => {
                tracing::warn!(
                    "Topic {} unavailable after {} attempts: {}",
                    topic.id,
                    attempts,
                    last_error
                );
                return ItemOutcome::Unavailable;
            }
        };

        let post = parse_post(&html);
        let links = classify_links(&link_text(&post));

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return ItemOutcome::Cancelled,
            outcome = self.classifier.classify(&post.body) => outcome,
        };
        let notes = if outcome.is_parsed() {
            NOTE_ANALYZED
        } else {
            NOTE_UNAVAILABLE
        };

        if cancel.is_cancelled() {
            return ItemOutcome::Cancelled;
        }

        let item = CrawlItem {
            id: topic.id,
            title: post.title,
            author: post.author,
            body_excerpt: excerpt(&post.body),
            posted_at: fetched_at,
            links: links.representative(),
            classification: outcome.classification(),
            analyzed_at: Utc::now(),
        };

        let record = match self.with_storage(|s| s.upsert(&item)) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Failed to store topic {}: {}", topic.id, e);
                return ItemOutcome::StoreFailed;
            }
        };

        if let Err(e) = self.with_storage(|s| {
            s.append_history(item.id, item.analyzed_at, record.final_score, notes)
        }) {
            tracing::error!("Failed to record history for topic {}: {}", topic.id, e);
        }

        if record.is_promising {
            tracing::warn!(
                "Promising project: {} (topic {}, score {})",
                item.title,
                item.id,
                record.final_score
            );
        } else {
            tracing::info!(
                "Topic {} scored {}: {}",
                item.id,
                record.final_score,
                item.title
            );
        }

        ItemOutcome::Processed {
            score: record.final_score,
            promising: record.is_promising,
        }
    }

    fn with_storage<T>(&self, f: impl FnOnce(&mut S) -> StorageResult<T>) -> StorageResult<T> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;
        f(&mut storage)
    }
}

/// Body text plus anchor targets, one per line
///
/// Anchor text often differs from its href, so the targets are appended to
/// make sure they are categorized too.
fn link_text(post: &ExtractedPost) -> String {
    let mut text = post.body.clone();
    for link in &post.links {
        text.push('\n');
        text.push_str(link);
    }
    text
}
