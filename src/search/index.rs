//! Inverted index and document table built from the crawl log

use crate::log::CrawlRecord;
use crate::search::Tokenizer;
use std::collections::{BTreeMap, BTreeSet};

/// A searchable document; `id` is the crawl record's sequence number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: u64,
    pub url: String,
    pub title: String,
    pub description: String,
}

impl From<&CrawlRecord> for Document {
    fn from(record: &CrawlRecord) -> Self {
        Self {
            id: record.sequence,
            url: record.url.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
        }
    }
}

/// Documents keyed by id
pub type DocumentTable = BTreeMap<u64, Document>;

/// Term to posting set mapping
///
/// Ordered maps and sets keep equality and iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    postings: BTreeMap<String, BTreeSet<u64>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` to the posting set of each term
    pub fn insert<I, S>(&mut self, id: u64, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for term in terms {
            self.postings.entry(term.into()).or_default().insert(id);
        }
    }

    /// Gets the posting set of `term`
    pub fn postings(&self, term: &str) -> Option<&BTreeSet<u64>> {
        self.postings.get(term)
    }

    /// Returns true if document `id` contains `term`
    pub fn contains(&self, term: &str, id: u64) -> bool {
        self.postings
            .get(term)
            .is_some_and(|posting| posting.contains(&id))
    }

    /// Iterates terms in lexicographic order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// Builds the index and document table from crawl records
///
/// Title and description are tokenized separately and their terms chained,
/// so no term can span the boundary between them.
pub fn build(records: &[CrawlRecord], tokenizer: &Tokenizer) -> (InvertedIndex, DocumentTable) {
    let mut index = InvertedIndex::new();
    let mut documents = DocumentTable::new();

    for record in records {
        let terms = tokenizer
            .tokenize(&record.title)
            .into_iter()
            .chain(tokenizer.tokenize(&record.description));

        index.insert(record.sequence, terms);
        documents.insert(record.sequence, Document::from(record));
    }

    tracing::debug!(
        "Indexed {} documents, {} distinct terms",
        documents.len(),
        index.term_count()
    );

    (index, documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sequence: u64, title: &str, description: &str) -> CrawlRecord {
        CrawlRecord {
            sequence,
            url: format!("https://example.com/{}", sequence),
            title: title.to_string(),
            description: description.to_string(),
            crawled_at: "2024-01-01T00:00:00+00:00".to_string(),
            run_id: None,
        }
    }

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(["the", "a", "no"])
    }

    #[test]
    fn test_build_indexes_title_and_description() {
        let records = vec![
            record(1, "Rust Language", "A systems language"),
            record(2, "Python", "The language of data"),
        ];

        let (index, documents) = build(&records, &tokenizer());

        assert_eq!(documents.len(), 2);
        assert_eq!(
            index.postings("language").unwrap().iter().copied().collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(index.contains("systems", 1));
        assert!(!index.contains("systems", 2));
        assert!(index.postings("the").is_none());
    }

    #[test]
    fn test_title_and_description_do_not_merge() {
        let records = vec![record(1, "Hot", "dog")];
        let (index, _) = build(&records, &tokenizer());

        assert!(index.postings("hotdog").is_none());
        assert!(index.contains("hot", 1));
        assert!(index.contains("dog", 1));
    }

    #[test]
    fn test_placeholder_text_is_indexed_like_any_text() {
        let records = vec![record(1, "No Title", "No Description")];
        let (index, _) = build(&records, &tokenizer());

        assert_eq!(index.terms().collect::<Vec<_>>(), vec!["description", "title"]);
    }

    #[test]
    fn test_build_twice_is_identical() {
        let records = vec![
            record(1, "Main Page", "Wikipedia, the free encyclopedia"),
            record(2, "The New York Times", "Breaking News, US News, World News"),
            record(3, "Rust", "A language empowering everyone"),
        ];
        let tokenizer = tokenizer();

        let (first_index, first_docs) = build(&records, &tokenizer);
        let (second_index, second_docs) = build(&records, &tokenizer);

        assert_eq!(first_index, second_index);
        assert_eq!(first_docs, second_docs);
    }

    #[test]
    fn test_empty_log_builds_empty_index() {
        let (index, documents) = build(&[], &tokenizer());
        assert!(index.is_empty());
        assert!(documents.is_empty());
    }
}
