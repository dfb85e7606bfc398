//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the crawl log.

/// SQL schema for the crawl log
///
/// `crawl_records.seq` is assigned explicitly as `MAX(seq) + 1` inside the
/// append transaction, never by AUTOINCREMENT, so the id space stays dense.
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per successfully extracted page
CREATE TABLE IF NOT EXISTS crawl_records (
    seq INTEGER PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    crawled_at TEXT NOT NULL,
    run_id INTEGER REFERENCES runs(id)
);

-- One row per URL whose extraction failed
CREATE TABLE IF NOT EXISTS failed_attempts (
    url TEXT PRIMARY KEY,
    reason TEXT NOT NULL,
    attempted_at TEXT NOT NULL,
    run_id INTEGER REFERENCES runs(id)
);

-- Discovered but not yet visited
CREATE TABLE IF NOT EXISTS frontier (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    discovered_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
