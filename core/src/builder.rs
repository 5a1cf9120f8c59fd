//! Batch construction of the inverted index.
//!
//! The builder always starts from nothing. Callers that persist the result
//! are expected to clear the target store first (see
//! [`IndexStore::clear`](crate::persist::IndexStore::clear)); there is no
//! incremental update path.

use crate::error::{DocSearchError, Result};
use crate::extract::ExtractorRegistry;
use crate::index::{DocId, DocMeta, Document, InvertedIndex, Posting, TermId};
use crate::normalizer::Normalizer;
use rayon::prelude::*;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

pub struct IndexBuilder<'a> {
    normalizer: &'a Normalizer,
    index: InvertedIndex,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(normalizer: &'a Normalizer) -> Self {
        Self { normalizer, index: InvertedIndex::new() }
    }

    /// Build an index from documents in the order given.
    pub fn build<I>(normalizer: &'a Normalizer, documents: I) -> InvertedIndex
    where
        I: IntoIterator<Item = Document>,
    {
        let mut builder = Self::new(normalizer);
        for doc in documents {
            builder.add_document(&doc.filename, &doc.raw_text);
        }
        builder.finish()
    }

    /// Normalize and add one document, returning its id.
    pub fn add_document(&mut self, filename: &str, text: &str) -> DocId {
        let tokens = self.normalizer.normalize(text);
        self.add_tokens(filename, tokens)
    }

    /// Add a document whose text was normalized elsewhere (e.g. on another
    /// thread). Ids are handed out in call order.
    pub fn add_tokens(&mut self, filename: &str, tokens: Vec<String>) -> DocId {
        let doc_id = self.index.num_docs;
        self.index.num_docs += 1;

        let length = tokens.len() as u32;
        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        for term in tokens {
            let next_id = self.index.dictionary.len() as TermId;
            let tid = *self.index.dictionary.entry(term).or_insert(next_id);
            if tid == next_id && self.index.df.len() <= tid as usize {
                self.index.df.push(0);
            }
            *tf_counts.entry(tid).or_insert(0) += 1;
        }

        // Each distinct term bumps df once; ids are increasing, so pushing
        // keeps every posting list sorted by doc_id.
        for (tid, term_frequency) in tf_counts {
            self.index.df[tid as usize] += 1;
            self.index.postings.entry(tid).or_default().push(Posting { doc_id, term_frequency });
        }

        self.index.total_tokens += u64::from(length);
        self.index.docs.insert(doc_id, DocMeta { filename: filename.to_string(), length });
        doc_id
    }

    pub fn num_docs(&self) -> u32 {
        self.index.num_docs
    }

    pub fn finish(self) -> InvertedIndex {
        tracing::info!(
            num_docs = self.index.num_docs,
            num_terms = self.index.num_terms(),
            "index built"
        );
        self.index
    }
}

/// A file offered to the batch pipeline.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub path: PathBuf,
}

impl DocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

#[derive(Debug)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub error: DocSearchError,
}

#[derive(Debug)]
pub struct BuildReport {
    pub index: InvertedIndex,
    pub indexed: usize,
    pub skipped: Vec<SkippedDocument>,
}

/// Extract, normalize and index a batch of files.
///
/// Extraction and normalization run in parallel; documents are merged into
/// the index serially in input order, so ids follow `sources`. A document
/// that fails to extract is logged and left out; it never aborts the batch.
pub fn index_sources(
    sources: &[DocumentSource],
    registry: &ExtractorRegistry,
    normalizer: &Normalizer,
) -> BuildReport {
    let prepared: Vec<Result<Vec<String>>> = sources
        .par_iter()
        .map(|src| extract_guarded(registry, &src.path).map(|text| normalizer.normalize(&text)))
        .collect();

    let mut builder = IndexBuilder::new(normalizer);
    let mut skipped = Vec::new();
    for (src, outcome) in sources.iter().zip(prepared) {
        match outcome {
            Ok(tokens) => {
                let filename = src.filename();
                let doc_id = builder.add_tokens(&filename, tokens);
                tracing::info!(doc_id, file = %filename, "indexed file");
            }
            Err(error) => {
                tracing::warn!(path = %src.path.display(), %error, "skipping file");
                skipped.push(SkippedDocument { path: src.path.clone(), error });
            }
        }
    }

    let indexed = builder.num_docs() as usize;
    BuildReport { index: builder.finish(), indexed, skipped }
}

// Third-party format parsers can panic on malformed input; one bad file must
// not take the whole build down.
fn extract_guarded(registry: &ExtractorRegistry, path: &Path) -> Result<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| registry.extract(path))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "parser panicked".to_string());
            Err(DocSearchError::extraction(path, message))
        }
    }
}
