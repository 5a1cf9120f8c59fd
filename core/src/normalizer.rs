//! Text normalization for Romanian documents and queries.
//!
//! Every string that reaches the index, and every query, goes through the
//! same stages: tokenize, lowercase and fold diacritics, drop stopwords,
//! stem. Index and query text must agree on all of them or terms
//! will never match.

use crate::stopwords::StopwordSet;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Marks stay inside the run so text that is already decomposed (NFD)
    // is not split at every accent.
    static ref WORD: Regex = Regex::new(r"(?u)[\p{L}\p{M}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::Romanian);
}

/// Split text into candidate words. Punctuation, whitespace, the clitic
/// hyphen (`într-o`) and apostrophes all separate tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    WORD.find_iter(text).map(|m| m.as_str())
}

/// Lowercase, decompose and strip every combining mark, so `ș`, `ş`, `ț`,
/// `ţ`, `ă`, `â` and `î` reduce to their base letters.
pub fn fold(token: &str) -> String {
    token
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

// Enough for every suffix chain the Romanian stemmer peels off.
const MAX_STEM_PASSES: usize = 8;

/// Snowball Romanian stem, re-applied until the output no longer changes.
///
/// A single pass is not always a fixed point (`-ism` becomes `-ist`, and
/// `celula` loses `-a`, then `-ul`), so `stem(stem(w)) == stem(w)` only
/// holds for the repeated form.
pub fn stem(token: &str) -> String {
    stem_until(token, |_| false)
}

/// Repeated stemming that stops before a pass whose output satisfies
/// `reject`. The result is itself a fixed point under the same rule.
fn stem_until(token: &str, reject: impl Fn(&str) -> bool) -> String {
    let mut current = token.to_string();
    for _ in 0..MAX_STEM_PASSES {
        let next = STEMMER.stem(&current);
        if next == current.as_str() || next.is_empty() || reject(&next) {
            break;
        }
        current = next.into_owned();
    }
    current
}

/// The configured normalization pipeline. Cheap to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    stopwords: StopwordSet,
}

impl Normalizer {
    pub fn new(stopwords: StopwordSet) -> Self {
        Self { stopwords }
    }

    /// Normalizer using the built-in Romanian stopword list.
    pub fn romanian() -> Self {
        Self::new(StopwordSet::romanian())
    }

    pub fn stopwords(&self) -> &StopwordSet {
        &self.stopwords
    }

    /// Turn raw text into the ordered sequence of index tokens.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        tokenize(text).filter_map(|raw| self.normalize_token(raw)).collect()
    }

    /// Normalize one already-tokenized word; `None` when it folds away or is
    /// a stopword.
    ///
    /// Stopwords are matched on the folded surface form, before stemming.
    /// Stemming never steps onto a stopword either (`celula` stays `celul`
    /// instead of reaching `cel`), otherwise a second pass over the output
    /// would drop the token.
    pub fn normalize_token(&self, raw: &str) -> Option<String> {
        let folded = fold(raw);
        if folded.is_empty() || self.stopwords.contains(&folded) {
            return None;
        }
        Some(stem_until(&folded, |s| self.stopwords.contains(s)))
    }
}
