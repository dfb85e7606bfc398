//! Extraction adapter: URL in, page metadata and outbound links out
//!
//! The crawler only talks to the [`Extractor`] trait. [`HttpExtractor`] is the
//! default implementation, built on `reqwest` and `scraper`.

mod html;
mod http;

pub use html::{parse_html, ParsedPage, NO_DESCRIPTION, NO_TITLE};
pub use http::{build_http_client, HttpExtractor};

use std::future::Future;
use thiserror::Error;
use url::Url;

/// Metadata and links extracted from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Page title, or [`NO_TITLE`]
    pub title: String,

    /// Meta description, or [`NO_DESCRIPTION`]
    pub description: String,

    /// Deduplicated absolute http/https links, in document order
    pub links: Vec<String>,
}

/// Why a page could not be extracted
///
/// Every variant is a per-URL failure: the URL is marked visited and the
/// crawl moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Expected HTML, got {0}")]
    NotHtml(String),

    /// Any other transport or body-read error
    #[error("Transport error: {0}")]
    Transport(String),

    /// The extractor panicked; reported by the crawler, never by an extractor
    #[error("Extraction panicked")]
    Panicked,
}

/// Result of one extraction
pub type ExtractResult = Result<Extraction, ExtractionFailure>;

/// Turns a URL into page metadata and outbound links
///
/// Implementations must be cheap to share: the crawler wraps them in an `Arc`
/// and calls `extract` from several tasks at once.
pub trait Extractor: Send + Sync + 'static {
    fn extract(&self, url: &Url) -> impl Future<Output = ExtractResult> + Send;
}
