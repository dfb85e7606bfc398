//! Output module for reports printed by the CLI
//!
//! This module handles:
//! - Crawl log statistics and end-of-run summaries
//! - Rendering search results

mod results;
pub mod stats;

pub use results::{format_results, NO_RESULTS};
pub use stats::{load_statistics, print_crawl_summary, print_statistics, CrawlStatistics};
