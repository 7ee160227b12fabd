//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Talkscan database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per forum topic, replaced wholesale on re-analysis
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    body_excerpt TEXT NOT NULL,
    posted_at TEXT NOT NULL,
    github_url TEXT,
    whitepaper_url TEXT,
    website_url TEXT,
    technical_score INTEGER NOT NULL,
    innovation_score INTEGER NOT NULL,
    disruptiveness_score INTEGER NOT NULL,
    is_fork INTEGER NOT NULL,
    fork_base TEXT NOT NULL,
    mining_algorithm TEXT NOT NULL,
    consensus_mechanism TEXT NOT NULL,
    realism_assessment TEXT NOT NULL,
    unique_features TEXT NOT NULL,
    red_flags TEXT NOT NULL,
    strengths TEXT NOT NULL,
    premine_estimate REAL NOT NULL,
    final_score INTEGER NOT NULL,
    is_promising INTEGER NOT NULL,
    analyzed_at TEXT NOT NULL,
    last_updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_score ON items(final_score DESC);
CREATE INDEX IF NOT EXISTS idx_items_promising ON items(is_promising);

-- Append-only audit trail of analyses
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL REFERENCES items(id),
    recorded_at TEXT NOT NULL,
    score INTEGER NOT NULL,
    notes TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_item ON history(item_id);
"#;

/// Initializes the database schema
///
/// Every statement is `IF NOT EXISTS`, so this is safe on an existing
/// database.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
