//! The analyzed unit: one forum topic and everything derived from it

use crate::classifier::Classification;
use crate::scoring;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters of post body kept in the stored excerpt
pub const EXCERPT_CHARS: usize = 1000;

/// One representative URL per category; the first one found wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLinks {
    pub github: Option<String>,
    pub whitepaper: Option<String>,
    pub website: Option<String>,
}

/// A crawled and classified forum topic
///
/// The final score is not a field: it is always derived from the
/// classification and the link presence flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlItem {
    /// Topic id, the primary key
    pub id: i64,
    pub title: String,
    pub author: String,
    pub body_excerpt: String,
    pub posted_at: DateTime<Utc>,
    pub links: ItemLinks,
    pub classification: Classification,
    pub analyzed_at: DateTime<Utc>,
}

impl CrawlItem {
    pub fn has_whitepaper(&self) -> bool {
        self.links.whitepaper.is_some()
    }

    pub fn has_github(&self) -> bool {
        self.links.github.is_some()
    }

    /// Weighted score in `[0, 100]`
    pub fn final_score(&self) -> u8 {
        scoring::score(
            &self.classification,
            self.has_whitepaper(),
            self.has_github(),
        )
    }

    pub fn is_promising(&self) -> bool {
        scoring::is_promising(self.final_score())
    }
}

/// Cuts a post body down to the stored excerpt, appending `...` when cut
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
