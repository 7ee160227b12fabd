//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::CrawlItem;
use crate::storage::{HistoryEntry, ItemRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Items are keyed by topic id. Every write to an item replaces all of its
/// fields; history rows are only ever appended.
pub trait Storage {
    // ===== Items =====

    /// Whether an item with this id is already stored
    fn exists(&self, id: i64) -> StorageResult<bool>;

    /// Inserts the item or replaces every field of the stored one
    ///
    /// The stored final score and promising flag are recomputed from the
    /// item, and the update timestamp is set to now. Runs in a single
    /// transaction.
    fn upsert(&mut self, item: &CrawlItem) -> StorageResult<ItemRecord>;

    /// Gets an item by id
    fn get(&self, id: i64) -> StorageResult<Option<ItemRecord>>;

    /// All items, best score first, ties broken by ascending id
    fn query_by_score(&self) -> StorageResult<Vec<ItemRecord>>;

    /// The `limit` best items, in the same order as `query_by_score`
    fn query_top(&self, limit: usize) -> StorageResult<Vec<ItemRecord>>;

    // ===== History =====

    /// Appends an audit row for an existing item and returns its id
    fn append_history(
        &mut self,
        item_id: i64,
        recorded_at: DateTime<Utc>,
        score: u8,
        notes: &str,
    ) -> StorageResult<i64>;

    /// History of one item in insertion order
    fn history(&self, item_id: i64) -> StorageResult<Vec<HistoryEntry>>;

    // ===== Statistics =====

    fn count_items(&self) -> StorageResult<u64>;

    fn count_promising(&self) -> StorageResult<u64>;

    /// Mean final score, 0.0 for an empty store
    fn average_score(&self) -> StorageResult<f64>;
}
