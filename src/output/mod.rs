//! Output module for reports on analyzed items
//!
//! This module handles:
//! - Building the JSON report from the store
//! - Writing it to the configured report path
//! - Printing run and report summaries to the console

pub mod report;
pub mod stats;

pub use report::{build_report, write_report, Report, TopItem, TOP_ITEMS};
pub use stats::{print_crawl_stats, print_report};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur while producing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to read from storage: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
