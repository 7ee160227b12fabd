//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::classifier::Classification;
use crate::state::{CrawlItem, ItemLinks};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{HistoryEntry, ItemRecord};
use crate::TalkscanError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Column order shared by every item query; `row_to_record` depends on it
const ITEM_COLUMNS: &str = "id, title, author, body_excerpt, posted_at, \
    github_url, whitepaper_url, website_url, \
    technical_score, innovation_score, disruptiveness_score, \
    is_fork, fork_base, mining_algorithm, consensus_mechanism, realism_assessment, \
    unique_features, red_flags, strengths, premine_estimate, \
    final_score, is_promising, analyzed_at, last_updated_at";

const UPSERT_SQL: &str = "
    INSERT INTO items (
        id, title, author, body_excerpt, posted_at,
        github_url, whitepaper_url, website_url,
        technical_score, innovation_score, disruptiveness_score,
        is_fork, fork_base, mining_algorithm, consensus_mechanism, realism_assessment,
        unique_features, red_flags, strengths, premine_estimate,
        final_score, is_promising, analyzed_at, last_updated_at
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
        ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24
    )
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        author = excluded.author,
        body_excerpt = excluded.body_excerpt,
        posted_at = excluded.posted_at,
        github_url = excluded.github_url,
        whitepaper_url = excluded.whitepaper_url,
        website_url = excluded.website_url,
        technical_score = excluded.technical_score,
        innovation_score = excluded.innovation_score,
        disruptiveness_score = excluded.disruptiveness_score,
        is_fork = excluded.is_fork,
        fork_base = excluded.fork_base,
        mining_algorithm = excluded.mining_algorithm,
        consensus_mechanism = excluded.consensus_mechanism,
        realism_assessment = excluded.realism_assessment,
        unique_features = excluded.unique_features,
        red_flags = excluded.red_flags,
        strengths = excluded.strengths,
        premine_estimate = excluded.premine_estimate,
        final_score = excluded.final_score,
        is_promising = excluded.is_promising,
        analyzed_at = excluded.analyzed_at,
        last_updated_at = excluded.last_updated_at
";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// Opens (or creates) the database file, enables WAL and foreign keys,
    /// and initializes the schema.
    pub fn new(path: &Path) -> Result<Self, TalkscanError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, TalkscanError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Closes the connection, reporting any error SQLite raises on close
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| StorageError::from(e))
    }
}

impl Storage for SqliteStorage {
    // ===== Items =====

    fn exists(&self, id: i64) -> StorageResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM items WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn upsert(&mut self, item: &CrawlItem) -> StorageResult<ItemRecord> {
        let c = &item.classification;
        let unique_features = to_json(&c.unique_features)?;
        let red_flags = to_json(&c.red_flags)?;
        let strengths = to_json(&c.strengths)?;

        let final_score = item.final_score();
        let is_promising = item.is_promising();
        let last_updated_at = Utc::now();

        let tx = self.conn.transaction()?;
        tx.execute(
            UPSERT_SQL,
            params![
                item.id,
                item.title,
                item.author,
                item.body_excerpt,
                item.posted_at.to_rfc3339(),
                item.links.github,
                item.links.whitepaper,
                item.links.website,
                c.technical_score,
                c.innovation_score,
                c.disruptiveness_score,
                c.is_fork,
                c.fork_base,
                c.mining_algorithm,
                c.consensus_mechanism,
                c.realism_assessment,
                unique_features,
                red_flags,
                strengths,
                c.premine_estimate,
                final_score,
                is_promising,
                item.analyzed_at.to_rfc3339(),
                last_updated_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        Ok(ItemRecord {
            item: item.clone(),
            final_score,
            is_promising,
            last_updated_at,
        })
    }

    fn get(&self, id: i64) -> StorageResult<Option<ItemRecord>> {
        let sql = format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS);
        let record = self
            .conn
            .query_row(&sql, params![id], row_to_record)
            .optional()?;
        Ok(record)
    }

    fn query_by_score(&self) -> StorageResult<Vec<ItemRecord>> {
        let sql = format!(
            "SELECT {} FROM items ORDER BY final_score DESC, id ASC",
            ITEM_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn query_top(&self, limit: usize) -> StorageResult<Vec<ItemRecord>> {
        let sql = format!(
            "SELECT {} FROM items ORDER BY final_score DESC, id ASC LIMIT ?1",
            ITEM_COLUMNS
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![limit], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    // ===== History =====

    fn append_history(
        &mut self,
        item_id: i64,
        recorded_at: DateTime<Utc>,
        score: u8,
        notes: &str,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO history (item_id, recorded_at, score, notes) VALUES (?1, ?2, ?3, ?4)",
            params![item_id, recorded_at.to_rfc3339(), score, notes],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn history(&self, item_id: i64) -> StorageResult<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_id, recorded_at, score, notes FROM history WHERE item_id = ?1 ORDER BY id",
        )?;

        let entries = stmt
            .query_map(params![item_id], |row| {
                Ok(HistoryEntry {
                    id: row.get(0)?,
                    item_id: row.get(1)?,
                    recorded_at: parse_timestamp(2, row.get(2)?)?,
                    score: row.get(3)?,
                    notes: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }

    // ===== Statistics =====

    fn count_items(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_promising(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE is_promising = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn average_score(&self) -> StorageResult<f64> {
        let average: Option<f64> =
            self.conn
                .query_row("SELECT AVG(final_score) FROM items", [], |row| row.get(0))?;
        Ok(average.unwrap_or(0.0))
    }
}

/// Maps a row selected with `ITEM_COLUMNS` back to a record
fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ItemRecord> {
    let classification = Classification {
        technical_score: row.get(8)?,
        innovation_score: row.get(9)?,
        disruptiveness_score: row.get(10)?,
        is_fork: row.get(11)?,
        fork_base: row.get(12)?,
        mining_algorithm: row.get(13)?,
        consensus_mechanism: row.get(14)?,
        realism_assessment: row.get(15)?,
        unique_features: parse_list(16, row.get(16)?)?,
        red_flags: parse_list(17, row.get(17)?)?,
        strengths: parse_list(18, row.get(18)?)?,
        premine_estimate: row.get(19)?,
    };

    let item = CrawlItem {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        body_excerpt: row.get(3)?,
        posted_at: parse_timestamp(4, row.get(4)?)?,
        links: ItemLinks {
            github: row.get(5)?,
            whitepaper: row.get(6)?,
            website: row.get(7)?,
        },
        classification,
        analyzed_at: parse_timestamp(22, row.get(22)?)?,
    };

    Ok(ItemRecord {
        item,
        final_score: row.get(20)?,
        is_promising: row.get(21)?,
        last_updated_at: parse_timestamp(23, row.get(23)?)?,
    })
}

fn to_json(list: &[String]) -> StorageResult<String> {
    serde_json::to_string(list).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn parse_list(idx: usize, value: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
