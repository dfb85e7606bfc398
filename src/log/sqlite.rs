//! SQLite crawl log implementation
//!
//! This module provides a SQLite-based implementation of the CrawlLog trait.

use crate::log::schema::initialize_schema;
use crate::log::traits::{CrawlLog, StorageError, StorageResult};
use crate::log::{CrawlRecord, LogEntry, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const RECORD_COLUMNS: &str = "seq, url, title, description, crawled_at, run_id";

/// SQLite crawl log backend
///
/// The connection sits behind a mutex: appends from concurrent tasks are
/// serialized, and each append is a single transaction.
pub struct SqliteCrawlLog {
    conn: Mutex<Connection>,
}

impl SqliteCrawlLog {
    /// Opens or creates a crawl log at `path`
    ///
    /// Fails if the file is not a SQLite database or does not pass
    /// `PRAGMA quick_check`.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // WAL + FULL: a committed append survives a crash right after return
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        check_integrity(&conn)?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory crawl log (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

fn check_integrity(conn: &Connection) -> StorageResult<()> {
    let verdict: String = conn.query_row("PRAGMA quick_check", [], |row| row.get(0))?;
    if verdict != "ok" {
        return Err(StorageError::Corrupt(verdict));
    }
    Ok(())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlRecord> {
    Ok(CrawlRecord {
        sequence: row.get::<_, i64>(0)? as u64,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        crawled_at: row.get(4)?,
        run_id: row.get(5)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Failed),
    })
}

/// Maps a UNIQUE violation on `url` to [`StorageError::Duplicate`]
fn map_duplicate(err: rusqlite::Error, url: &str) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StorageError::Duplicate(url.to_string())
        }
        _ => StorageError::Sqlite(err),
    }
}

/// Inserts a record with the next sequence number inside an open transaction
fn insert_record(
    tx: &rusqlite::Transaction<'_>,
    entry: &LogEntry,
    run_id: Option<i64>,
) -> StorageResult<CrawlRecord> {
    let next: i64 = tx.query_row(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM crawl_records",
        [],
        |row| row.get(0),
    )?;
    let now = Utc::now().to_rfc3339();

    tx.execute(
        "INSERT INTO crawl_records (seq, url, title, description, crawled_at, run_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![next, entry.url, entry.title, entry.description, now, run_id],
    )
    .map_err(|e| map_duplicate(e, &entry.url))?;

    tx.execute("DELETE FROM frontier WHERE url = ?1", params![entry.url])?;

    Ok(CrawlRecord {
        sequence: next as u64,
        url: entry.url.clone(),
        title: entry.title.clone(),
        description: entry.description.clone(),
        crawled_at: now,
        run_id,
    })
}

fn insert_pending(tx: &rusqlite::Transaction<'_>, urls: &[String]) -> StorageResult<()> {
    let now = Utc::now().to_rfc3339();
    let mut stmt =
        tx.prepare_cached("INSERT OR IGNORE INTO frontier (url, discovered_at) VALUES (?1, ?2)")?;
    for url in urls {
        stmt.execute(params![url, now])?;
    }
    Ok(())
}

impl CrawlLog for SqliteCrawlLog {
    // ===== Run Management =====

    fn create_run(&self, config_hash: &str) -> StorageResult<i64> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn finish_run(&self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let updated = conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let conn = self.lock()?;
        let run = conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn count_runs(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Records =====

    fn append(
        &self,
        entry: &LogEntry,
        run_id: Option<i64>,
        discovered: &[String],
    ) -> StorageResult<CrawlRecord> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let record = insert_record(&tx, entry, run_id)?;
        insert_pending(&tx, discovered)?;

        tx.commit()?;
        Ok(record)
    }

    fn import_record(&self, entry: &LogEntry) -> StorageResult<Option<CrawlRecord>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT seq FROM crawl_records WHERE url = ?1",
                params![entry.url],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Ok(None);
        }

        let record = insert_record(&tx, entry, None)?;
        tx.commit()?;
        Ok(Some(record))
    }

    fn read_all(&self) -> StorageResult<Vec<CrawlRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM crawl_records ORDER BY seq ASC",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn last_record(&self) -> StorageResult<Option<CrawlRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM crawl_records ORDER BY seq DESC LIMIT 1",
                    RECORD_COLUMNS
                ),
                [],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM crawl_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Visited Set =====

    fn mark_failed(&self, url: &str, reason: &str, run_id: Option<i64>) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT OR IGNORE INTO failed_attempts (url, reason, attempted_at, run_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![url, reason, now, run_id],
        )?;
        tx.execute("DELETE FROM frontier WHERE url = ?1", params![url])?;

        tx.commit()?;
        Ok(())
    }

    fn load_visited_set(&self) -> StorageResult<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT url FROM crawl_records UNION SELECT url FROM failed_attempts")?;

        let visited = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(visited)
    }

    fn count_failed(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM failed_attempts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Pending Frontier =====

    fn enqueue_pending(&self, urls: &[String]) -> StorageResult<()> {
        if urls.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        insert_pending(&tx, urls)?;
        tx.commit()?;
        Ok(())
    }

    fn load_pending(&self) -> StorageResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT url FROM frontier ORDER BY id ASC")?;

        let pending = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pending)
    }

    fn count_pending(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM frontier", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
