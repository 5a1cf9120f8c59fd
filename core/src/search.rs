//! Ranked retrieval over a loaded index.
//!
//! Queries are parsed, normalized with the same [`Normalizer`] that built
//! the index and scored with Okapi BM25.

use crate::error::Result;
use crate::index::{DocId, InvertedIndex};
use crate::normalizer::Normalizer;
use crate::query::{parse_query, Occur};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_K: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term frequency saturation.
    pub k1: f32,
    /// Strength of document length normalization, 0.0..=1.0.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f32,
}

/// A clause after normalization; all of its terms must be present for a
/// document to match it.
struct ResolvedClause {
    occur: Occur,
    terms: Vec<String>,
}

pub struct SearchEngine<'a> {
    index: &'a InvertedIndex,
    normalizer: &'a Normalizer,
    params: Bm25Params,
}

impl<'a> SearchEngine<'a> {
    pub fn new(index: &'a InvertedIndex, normalizer: &'a Normalizer) -> Self {
        Self { index, normalizer, params: Bm25Params::default() }
    }

    pub fn with_params(mut self, params: Bm25Params) -> Self {
        self.params = params;
        self
    }

    /// Top `k` documents for `query`, best first; equal scores are ordered
    /// by ascending document id.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let parsed = parse_query(query)?;

        let clauses: Vec<ResolvedClause> = parsed
            .clauses
            .iter()
            .filter_map(|c| {
                let mut terms = self.normalizer.normalize(&c.text);
                dedup_in_order(&mut terms);
                (!terms.is_empty()).then_some(ResolvedClause { occur: c.occur, terms })
            })
            .collect();

        if !clauses.iter().any(|c| c.occur != Occur::MustNot) || k == 0 {
            tracing::debug!(query, "query has no searchable terms");
            return Ok(Vec::new());
        }

        let candidates = self.candidates(&clauses);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut scoring_terms: Vec<&str> = clauses
            .iter()
            .filter(|c| c.occur != Occur::MustNot)
            .flat_map(|c| c.terms.iter().map(String::as_str))
            .collect();
        scoring_terms.sort_unstable();
        scoring_terms.dedup();

        let mut scores: HashMap<DocId, f32> = candidates.iter().map(|&d| (d, 0.0)).collect();
        for term in scoring_terms {
            let idf = self.idf(term);
            for posting in self.index.postings(term) {
                if let Some(score) = scores.get_mut(&posting.doc_id) {
                    *score += idf * self.tf_norm(posting.term_frequency, posting.doc_id);
                }
            }
        }

        let mut hits: Vec<SearchHit> = scores.into_iter().map(|(doc_id, score)| SearchHit { doc_id, score }).collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
        hits.truncate(k);
        tracing::debug!(query, candidates = candidates.len(), returned = hits.len(), "search complete");
        Ok(hits)
    }

    fn candidates(&self, clauses: &[ResolvedClause]) -> Vec<DocId> {
        let matches = |c: &ResolvedClause| self.clause_docs(c);

        let required: Vec<&ResolvedClause> = clauses.iter().filter(|c| c.occur == Occur::Must).collect();
        let mut docs: Vec<DocId> = if required.is_empty() {
            let mut union: Vec<DocId> = clauses
                .iter()
                .filter(|c| c.occur == Occur::Should)
                .flat_map(|c| matches(c))
                .collect();
            union.sort_unstable();
            union.dedup();
            union
        } else {
            required
                .iter()
                .map(|c| matches(*c))
                .reduce(|acc, next| intersect_sorted(&acc, &next))
                .unwrap_or_default()
        };

        let excluded: HashSet<DocId> = clauses
            .iter()
            .filter(|c| c.occur == Occur::MustNot)
            .flat_map(|c| matches(c))
            .collect();
        docs.retain(|d| !excluded.contains(d));
        docs
    }

    /// Sorted ids of documents containing every term of the clause.
    fn clause_docs(&self, clause: &ResolvedClause) -> Vec<DocId> {
        clause
            .terms
            .iter()
            .map(|t| self.index.postings(t).iter().map(|p| p.doc_id).collect::<Vec<_>>())
            .reduce(|acc, next| intersect_sorted(&acc, &next))
            .unwrap_or_default()
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.index.num_docs as f32;
        let df = self.index.doc_freq(term) as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn tf_norm(&self, tf: u32, doc_id: DocId) -> f32 {
        let Bm25Params { k1, b } = self.params;
        let avg = self.index.avg_doc_len().max(1.0);
        let len = self.index.doc(doc_id).map_or(avg, |d| d.length as f32);
        let tf = tf as f32;
        tf * (k1 + 1.0) / (tf + k1 * (1.0 - b + b * len / avg))
    }
}

/// Search with default BM25 parameters.
pub fn search(query: &str, index: &InvertedIndex, normalizer: &Normalizer, k: usize) -> Result<Vec<SearchHit>> {
    SearchEngine::new(index, normalizer).search(query, k)
}

fn intersect_sorted(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn dedup_in_order(terms: &mut Vec<String>) {
    let mut seen = HashSet::new();
    terms.retain(|t| seen.insert(t.clone()));
}
