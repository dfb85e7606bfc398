//! Text normalization and stopword filtering

use crate::SeekError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Splits text into normalized, stopword-free terms
///
/// Text is lowercased, every character that is neither alphanumeric, `_`,
/// nor whitespace is removed, and the rest is split on whitespace. The same
/// tokenizer is used for documents and queries.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
}

impl Tokenizer {
    /// Creates a tokenizer from an explicit stopword list
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: stopwords
                .into_iter()
                .map(|word| word.as_ref().trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    /// Loads the stopword lexicon from a file
    ///
    /// One word per line; blank lines and lines starting with `#` are ignored.
    /// A missing or unreadable file is an error.
    pub fn from_file(path: &Path) -> Result<Self, SeekError> {
        let content = fs::read_to_string(path).map_err(|source| SeekError::Stopwords {
            path: path.display().to_string(),
            source,
        })?;

        let tokenizer = Self::new(parse_stopwords(&content));
        tracing::debug!(
            "Loaded {} stopwords from {}",
            tokenizer.stopword_count(),
            path.display()
        );
        Ok(tokenizer)
    }

    /// Tokenizes `text` into terms, in order of appearance
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
            .collect();

        cleaned
            .split_whitespace()
            .filter(|term| !self.stopwords.contains(*term))
            .map(str::to_string)
            .collect()
    }

    /// Tokenizes `text` into its set of distinct terms
    pub fn term_set(&self, text: &str) -> HashSet<String> {
        self.tokenize(text).into_iter().collect()
    }

    /// Returns true if `word` is a stopword
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    pub fn stopword_count(&self) -> usize {
        self.stopwords.len()
    }
}

fn parse_stopwords(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
