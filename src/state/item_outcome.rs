//! Per-topic outcomes of a crawl and their running totals
//!
//! Every topic seen on a listing page ends in exactly one of these states.

use std::fmt;

/// What happened to one topic during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    // ===== Success =====
    /// Topic was fetched, classified, scored and stored
    Processed { score: u8, promising: bool },

    // ===== Skips =====
    /// Topic id is already in the store; nothing was fetched
    Skipped,

    /// Another worker holds this topic id right now
    InProgress,

    // ===== Failures (no record written; retried on a future run) =====
    /// Topic page could not be fetched within the retry budget
    Unavailable,

    /// Scoring finished but the upsert failed
    StoreFailed,

    /// The run was cancelled before the topic was stored
    Cancelled,
}

impl ItemOutcome {
    /// Returns true if a record was written for this topic
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }

    /// Returns true if the topic was deliberately left alone
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped | Self::InProgress)
    }

    /// Returns true if the topic should have been stored but was not
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Unavailable | Self::StoreFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed { .. } => "processed",
            Self::Skipped => "skipped",
            Self::InProgress => "in_progress",
            Self::Unavailable => "unavailable",
            Self::StoreFailed => "store_failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed { score, .. } => write!(f, "processed (score {})", score),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Totals for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_scanned: u32,
    pub pages_unavailable: u32,
    pub topics_seen: u32,
    pub processed: u32,
    pub promising: u32,
    pub skipped: u32,
    pub unavailable: u32,
    pub store_failures: u32,
    pub cancelled: u32,
}

impl CrawlStats {
    /// Adds one topic outcome to the totals
    pub fn record(&mut self, outcome: ItemOutcome) {
        self.topics_seen += 1;
        match outcome {
            ItemOutcome::Processed { promising, .. } => {
                self.processed += 1;
                if promising {
                    self.promising += 1;
                }
            }
            ItemOutcome::Skipped | ItemOutcome::InProgress => self.skipped += 1,
            ItemOutcome::Unavailable => self.unavailable += 1,
            ItemOutcome::StoreFailed => self.store_failures += 1,
            ItemOutcome::Cancelled => self.cancelled += 1,
        }
    }

    /// Total failed topics
    pub fn failures(&self) -> u32 {
        self.unavailable + self.store_failures
    }
}
