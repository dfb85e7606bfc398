//! Crawler module: frontier, dedup and crawl coordination
//!
//! This module contains the core crawling logic, including:
//! - Request scheduling and per-host pacing
//! - Overall crawl coordination, resume and shutdown

mod coordinator;
mod scheduler;

pub use coordinator::{run_crawl, CrawlOutcome, CrawlSummary, Coordinator};
pub use scheduler::{QueuedUrl, ScheduledFetch, Scheduler};
