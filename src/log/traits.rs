//! Crawl log trait and error types

use crate::log::{CrawlRecord, LogEntry, RunRecord, RunStatus};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during crawl log operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Crawl log is corrupt: {0}")]
    Corrupt(String),

    #[error("URL already recorded: {0}")]
    Duplicate(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Crawl log lock poisoned")]
    Poisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for crawl log operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for crawl log backends
///
/// Every method takes `&self`: implementations serialize writers internally
/// so a log can be shared between tasks behind an `Arc`. Each write is
/// durable once the call returns.
pub trait CrawlLog: Send + Sync {
    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    fn create_run(&self, config_hash: &str) -> StorageResult<i64>;

    /// Sets the final status and finish timestamp of a run
    fn finish_run(&self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Counts all runs ever started against this log
    fn count_runs(&self) -> StorageResult<u64>;

    // ===== Records =====

    /// Appends a crawl record and marks its URL visited
    ///
    /// In the same transaction, removes the URL from the pending frontier and
    /// persists `discovered` as new pending URLs. The record receives the next
    /// sequence number. Appending a URL that already has a record fails with
    /// [`StorageError::Duplicate`].
    fn append(
        &self,
        entry: &LogEntry,
        run_id: Option<i64>,
        discovered: &[String],
    ) -> StorageResult<CrawlRecord>;

    /// Appends a record unless the URL already has one
    ///
    /// Returns `None` for URLs that are already recorded.
    fn import_record(&self, entry: &LogEntry) -> StorageResult<Option<CrawlRecord>>;

    /// Reads every record in sequence order
    fn read_all(&self) -> StorageResult<Vec<CrawlRecord>>;

    /// Gets the record with the highest sequence number
    fn last_record(&self) -> StorageResult<Option<CrawlRecord>>;

    /// Counts recorded pages
    fn count_records(&self) -> StorageResult<u64>;

    // ===== Visited Set =====

    /// Marks a URL visited without a record, after a failed extraction
    ///
    /// Also removes the URL from the pending frontier. Marking a URL that
    /// already has a failed marker is a no-op.
    fn mark_failed(&self, url: &str, reason: &str, run_id: Option<i64>) -> StorageResult<()>;

    /// Loads every visited URL: recorded pages plus failed attempts
    fn load_visited_set(&self) -> StorageResult<HashSet<String>>;

    /// Counts failed attempts
    fn count_failed(&self) -> StorageResult<u64>;

    // ===== Pending Frontier =====

    /// Persists URLs that were enqueued but not yet visited
    ///
    /// URLs already pending are ignored.
    fn enqueue_pending(&self, urls: &[String]) -> StorageResult<()>;

    /// Loads pending URLs in the order they were discovered
    fn load_pending(&self) -> StorageResult<Vec<String>>;

    /// Counts pending URLs
    fn count_pending(&self) -> StorageResult<u64>;
}
