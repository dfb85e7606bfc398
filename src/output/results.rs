//! Rendering of search results for the terminal

use crate::search::SearchResult;
use std::fmt::Write;

/// Printed when a query matches nothing
pub const NO_RESULTS: &str = "No results found.";

/// Formats ranked results as numbered `Title (URL)` lines
pub fn format_results(results: &[SearchResult<'_>]) -> String {
    if results.is_empty() {
        return format!("{}\n", NO_RESULTS);
    }

    let mut out = format!("Top {} Results:\n\n", results.len());
    for (rank, result) in results.iter().enumerate() {
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "{}. {} ({})",
            rank + 1,
            result.document.title,
            result.document.url
        );
    }
    out
}
