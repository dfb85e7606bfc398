//! CSV export and import of the crawl log
//!
//! The CSV layout is three columns with a header row:
//! `URL,Title,Meta Description`. Records are written in sequence order, so
//! exporting and re-importing into an empty log reproduces the same ids.

use crate::log::{CrawlLog, LogEntry};
use crate::url::normalize_url;
use crate::SeekError;
use serde::Deserialize;
use std::path::Path;

/// Header row of the CSV layout
pub const CSV_HEADER: [&str; 3] = ["URL", "Title", "Meta Description"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Meta Description")]
    description: String,
}

/// Outcome of a CSV import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows appended as new records
    pub imported: usize,
    /// Rows whose URL was already recorded
    pub duplicates: usize,
    /// Rows with an unusable URL
    pub skipped: usize,
}

/// Writes every record to `path` as CSV, returning the number of rows
pub fn export_csv(log: &dyn CrawlLog, path: &Path) -> Result<usize, SeekError> {
    let records = log.read_all()?;
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(CSV_HEADER)?;
    for record in &records {
        writer.write_record([&record.url, &record.title, &record.description])?;
    }
    writer.flush()?;

    tracing::info!("Exported {} records to {}", records.len(), path.display());
    Ok(records.len())
}

/// Appends the rows of a CSV file to the log
///
/// The header row is skipped. URLs are normalized first; rows whose URL is
/// already recorded are counted as duplicates and left alone.
pub fn import_csv(log: &dyn CrawlLog, path: &Path) -> Result<ImportSummary, SeekError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)?;

    let mut summary = ImportSummary::default();

    for row in reader.deserialize::<CsvRow>() {
        let row = row?;

        let url = match normalize_url(&row.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Skipping CSV row with unusable URL {}: {}", row.url, e);
                summary.skipped += 1;
                continue;
            }
        };

        let entry = LogEntry {
            url: url.to_string(),
            title: row.title,
            description: row.description,
        };

        match log.import_record(&entry)? {
            Some(_) => summary.imported += 1,
            None => summary.duplicates += 1,
        }
    }

    tracing::info!(
        "Imported {} records from {} ({} duplicates, {} skipped)",
        summary.imported,
        path.display(),
        summary.duplicates,
        summary.skipped
    );

    Ok(summary)
}
