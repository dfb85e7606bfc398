//! Search module: tokenizer, inverted index and query processing
//!
//! The index is never persisted. It is rebuilt from a snapshot of the crawl
//! log each time a [`SearchEngine`] is created.

mod index;
mod query;
mod tokenizer;

pub use index::{build, Document, DocumentTable, InvertedIndex};
pub use query::{search, SearchResult, MAX_RESULTS};
pub use tokenizer::Tokenizer;

use crate::log::CrawlLog;
use crate::SeekError;

/// Tokenizer, index and documents bundled for serving queries
#[derive(Debug, Clone)]
pub struct SearchEngine {
    tokenizer: Tokenizer,
    index: InvertedIndex,
    documents: DocumentTable,
}

impl SearchEngine {
    /// Builds an engine over every record currently in the log
    pub fn from_log(log: &dyn CrawlLog, tokenizer: Tokenizer) -> Result<Self, SeekError> {
        let records = log.read_all()?;
        let (index, documents) = build(&records, &tokenizer);

        tracing::info!(
            "Search index ready: {} documents, {} terms",
            documents.len(),
            index.term_count()
        );

        Ok(Self {
            tokenizer,
            index,
            documents,
        })
    }

    /// Runs a query, returning at most [`MAX_RESULTS`] hits
    pub fn search(&self, query: &str) -> Vec<SearchResult<'_>> {
        search(query, &self.index, &self.documents, &self.tokenizer)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn term_count(&self) -> usize {
        self.index.term_count()
    }
}
