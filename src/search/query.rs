//! Query processing and term-overlap ranking

use crate::search::{Document, DocumentTable, InvertedIndex, Tokenizer};
use std::collections::{BTreeSet, HashSet};

/// Maximum number of results returned for one query
pub const MAX_RESULTS: usize = 10;

/// A ranked search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult<'a> {
    pub document: &'a Document,
    /// Number of distinct query terms the document contains
    pub score: usize,
}

/// Runs a free-text query against the index
///
/// Documents are scored by how many distinct query terms they contain and
/// sorted by score descending, then by ascending id. At most
/// [`MAX_RESULTS`] are returned; a query with no indexed terms returns an
/// empty list.
pub fn search<'a>(
    query: &str,
    index: &InvertedIndex,
    documents: &'a DocumentTable,
    tokenizer: &Tokenizer,
) -> Vec<SearchResult<'a>> {
    let terms: HashSet<String> = tokenizer.term_set(query);

    let candidates: BTreeSet<u64> = terms
        .iter()
        .filter_map(|term| index.postings(term))
        .flatten()
        .copied()
        .collect();

    let mut results: Vec<SearchResult<'a>> = candidates
        .into_iter()
        .filter_map(|id| {
            let document = documents.get(&id)?;
            let score = terms.iter().filter(|term| index.contains(term, id)).count();
            Some(SearchResult { document, score })
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.document.id.cmp(&b.document.id))
    });
    results.truncate(MAX_RESULTS);

    results
}
