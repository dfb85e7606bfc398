//! Statistics generation from the crawl log
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the log.

use crate::crawler::CrawlSummary;
use crate::log::{CrawlLog, RunRecord};
use crate::SeekError;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Pages with a crawl record
    pub total_records: u64,

    /// URLs whose extraction failed
    pub failed_attempts: u64,

    /// URLs discovered but not yet visited
    pub pending: u64,

    /// Crawl runs started against this log
    pub total_runs: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl CrawlStatistics {
    /// Share of visited URLs that produced a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        let visited = self.total_records + self.failed_attempts;
        if visited > 0 {
            (self.total_records as f64 / visited as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Loads statistics from the crawl log
pub fn load_statistics(log: &dyn CrawlLog) -> Result<CrawlStatistics, SeekError> {
    Ok(CrawlStatistics {
        total_records: log.count_records()?,
        failed_attempts: log.count_failed()?,
        pending: log.count_pending()?,
        total_runs: log.count_runs()?,
        latest_run: log.latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages recorded: {}", stats.total_records);
    println!("  Failed attempts: {}", stats.failed_attempts);
    println!("  Pending in frontier: {}", stats.pending);
    println!("  Runs: {}", stats.total_runs);
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest Run:");
        println!("  ID: {}", run.id);
        println!("  Status: {}", run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Config hash: {}", run.config_hash);
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} visited URLs recorded)",
        stats.success_rate(),
        stats.total_records,
        stats.total_records + stats.failed_attempts
    );
}

/// Prints the end-of-run summary of a crawl
pub fn print_crawl_summary(summary: &CrawlSummary) {
    println!("=== Crawl Run {} ===\n", summary.run_id);
    println!("  Outcome: {:?}", summary.outcome);
    println!("  Processed: {}", summary.processed);
    println!("  Recorded: {}", summary.recorded);
    println!("  Failed: {}", summary.failed);
    println!("  Left in frontier: {}", summary.frontier_remaining);
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
}
