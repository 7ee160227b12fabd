//! State module for crawled items and crawl progress
//!
//! # Components
//!
//! - `CrawlItem`: One analyzed forum topic, with its derived score
//! - `ItemOutcome`: What happened to a topic during a run (processed, skipped, failed)
//! - `CrawlStats`: Running totals of outcomes for one run

mod crawl_item;
mod item_outcome;

// Re-export main types
pub use crawl_item::{excerpt, CrawlItem, ItemLinks, EXCERPT_CHARS};
pub use item_outcome::{CrawlStats, ItemOutcome};
