use crate::error::Result;
use crate::normalizer::{fold, tokenize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const ROMANIAN: &str = include_str!("../resources/stopwords_ro.txt");

/// Stopwords in folded surface form (lowercase, no diacritics, unstemmed).
///
/// Entries are folded on load so that a list written in ordinary spelling
/// compares equal to folded tokens. They are not stemmed: `care` must not
/// turn every word stemming to `car` into a stopword.
#[derive(Debug, Clone, Default)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The list bundled with the crate.
    pub fn romanian() -> Self {
        Self::from_lines(ROMANIAN)
    }

    /// Parse a stopword list: one entry per line, blank lines and lines
    /// starting with `#` ignored.
    pub fn from_lines(text: &str) -> Self {
        let mut words = HashSet::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            words.extend(tokenize(line).map(fold).filter(|w| !w.is_empty()));
        }
        Self { words }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let set = Self::from_lines(&text);
        tracing::debug!(path = %path.as_ref().display(), entries = set.len(), "loaded stopwords");
        Ok(set)
    }

    /// `token` must already be folded.
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
