//! URL handling module for Sumi-Seek
//!
//! Normalization defines the dedup key used by the frontier and the crawl log;
//! host extraction keys per-host pacing.

mod domain;
mod normalize;

pub use domain::extract_host;
pub use normalize::{is_crawlable_scheme, normalize_url};
