//! URL lifecycle states
//!
//! A URL moves `Discovered -> Enqueued -> Visited` and never moves backwards.
//! Only `Visited` is durable; the other two live in memory for one run.
use std::fmt;

/// How a visit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitState {
    /// Extraction succeeded and a crawl record was appended
    Success,

    /// Extraction failed; a failed-attempt marker was written instead
    Failed,
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Where a URL currently is in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Seen as a link or seed, not yet accepted into the frontier
    Discovered,

    /// Waiting in the frontier or currently being extracted
    Enqueued,

    /// Processed; never enqueued again
    Visited,
}

impl UrlState {
    /// Returns true if a URL in this state may be added to the frontier
    pub fn can_enqueue(&self) -> bool {
        matches!(self, Self::Discovered)
    }
}
