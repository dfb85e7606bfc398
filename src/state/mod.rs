//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: where a URL is in its `Discovered -> Enqueued -> Visited` lifecycle
//! - `VisitState`: how a visit ended (success or failure)
//! - `HostState`: per-host pacing and in-flight accounting

mod host_state;
mod url_state;

pub use host_state::HostState;
pub use url_state::{UrlState, VisitState};
