use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TermId = u32;
pub type DocId = u32;

/// A document accepted for indexing. The text is consumed by the builder
/// and never persisted.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub raw_text: String,
}

impl Document {
    pub fn new(filename: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self { filename: filename.into(), raw_text: raw_text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub filename: String,
    /// Number of tokens the document produced after normalization.
    pub length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_frequency: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub dictionary: HashMap<String, TermId>,
    /// Document frequency, indexed by term id.
    pub df: Vec<u32>,
    pub postings: HashMap<TermId, Vec<Posting>>, // postings sorted by doc_id
    pub docs: HashMap<DocId, DocMeta>,
    pub num_docs: u32,
    pub total_tokens: u64,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.dictionary.get(term).copied()
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.term_id(term)
            .and_then(|tid| self.postings.get(&tid))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn doc_freq(&self, term: &str) -> u32 {
        self.term_id(term).and_then(|tid| self.df.get(tid as usize).copied()).unwrap_or(0)
    }

    pub fn doc(&self, doc_id: DocId) -> Option<&DocMeta> {
        self.docs.get(&doc_id)
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.dictionary.contains_key(term)
    }

    pub fn num_terms(&self) -> usize {
        self.dictionary.len()
    }

    pub fn avg_doc_len(&self) -> f32 {
        if self.num_docs == 0 {
            0.0
        } else {
            self.total_tokens as f32 / self.num_docs as f32
        }
    }
}
