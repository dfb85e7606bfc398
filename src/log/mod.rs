//! Crawl log: the durable record of a crawl
//!
//! This module handles all persistence for the crawler, including:
//! - Appending crawl records with dense, gap-free sequence numbers
//! - Failed-attempt markers, which together with records form the visited set
//! - The pending frontier, so discovered URLs survive a crash
//! - Run tracking
//! - CSV export/import in the three-column legacy format

mod export;
mod schema;
mod sqlite;
mod traits;

pub use export::{export_csv, import_csv, ImportSummary, CSV_HEADER};
pub use sqlite::SqliteCrawlLog;
pub use traits::{CrawlLog, StorageError, StorageResult};

use std::path::Path;

/// Opens (or creates) the crawl log at `path`
pub fn open_log(path: &Path) -> StorageResult<SqliteCrawlLog> {
    SqliteCrawlLog::open(path)
}

/// Page metadata about to be appended to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub url: String,
    pub title: String,
    pub description: String,
}

/// A committed crawl record
///
/// `sequence` doubles as the document id when the index is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRecord {
    pub sequence: u64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub crawled_at: String,
    pub run_id: Option<i64>,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
