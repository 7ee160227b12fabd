//! Storage module for persisting analyzed items
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Insert-or-replace of analyzed items keyed by topic id
//! - The append-only analysis history
//! - Aggregate queries for the report

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::CrawlItem;
use crate::TalkscanError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, TalkscanError> {
    SqliteStorage::new(path)
}

/// An item as persisted, with the values computed at write time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRecord {
    pub item: CrawlItem,
    pub final_score: u8,
    pub is_promising: bool,
    pub last_updated_at: DateTime<Utc>,
}

/// One row of the analysis audit trail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub item_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub score: u8,
    pub notes: String,
}
