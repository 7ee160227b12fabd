//! JSON report generation
//!
//! The report summarizes the whole store, not just the last run: totals,
//! the mean score, and the best-scored items.

use crate::output::OutputResult;
use crate::state::ItemLinks;
use crate::storage::{ItemRecord, Storage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Number of items listed in `top_items`
pub const TOP_ITEMS: usize = 10;

/// Report written once per run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total_items: u64,
    pub promising_count: u64,
    pub average_score: f64,
    pub top_items: Vec<TopItem>,
    pub generated_at: DateTime<Utc>,
}

/// One entry of the top list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopItem {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub technical_score: u8,
    pub innovation_score: u8,
    pub disruptiveness_score: u8,
    pub final_score: u8,
    pub premine_estimate: f64,
    pub is_fork: bool,
    pub mining_algorithm: String,
    pub consensus_mechanism: String,
    pub links: ItemLinks,
    pub analyzed_at: DateTime<Utc>,
    pub is_promising: bool,
}

impl From<ItemRecord> for TopItem {
    fn from(record: ItemRecord) -> Self {
        let ItemRecord {
            item,
            final_score,
            is_promising,
            ..
        } = record;
        let c = item.classification;

        Self {
            id: item.id,
            title: item.title,
            author: item.author,
            technical_score: c.technical_score,
            innovation_score: c.innovation_score,
            disruptiveness_score: c.disruptiveness_score,
            final_score,
            premine_estimate: c.premine_estimate,
            is_fork: c.is_fork,
            mining_algorithm: c.mining_algorithm,
            consensus_mechanism: c.consensus_mechanism,
            links: item.links,
            analyzed_at: item.analyzed_at,
            is_promising,
        }
    }
}

/// Builds a report from the current contents of the store
pub fn build_report(storage: &dyn Storage) -> OutputResult<Report> {
    let top_items = storage
        .query_top(TOP_ITEMS)?
        .into_iter()
        .map(TopItem::from)
        .collect();

    Ok(Report {
        total_items: storage.count_items()?,
        promising_count: storage.count_promising()?,
        average_score: storage.average_score()?,
        top_items,
        generated_at: Utc::now(),
    })
}

/// Writes the report as pretty-printed JSON, replacing any previous file
pub fn write_report(report: &Report, path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;

    tracing::info!("Report written to {}", path.display());
    Ok(())
}
