//! Okapi BM25 without query-term-frequency weighting.
//!
//! score(d, q) = sum over distinct query terms t in the lexicon of
//!   f / (K + f) * ln((N - n_t + 0.5) / (n_t + 0.5))
//! where K = k1 * ((1 - b) + b * dl / avgdl).
//! idf goes negative once a term appears in more than half the collection.

use crate::{DocId, DocTable, InvertedIndex, Lexicon};
use std::collections::HashMap;

/// Tuning parameters. Passed explicitly into every ranking call so that
/// parameter sweeps never share state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Self {
        Self { k1, b }
    }

    /// K for a document of `doc_len` tokens. With a zero average length (every
    /// document empty) the length ratio is taken as 1.
    pub fn length_norm(&self, doc_len: u32, avg_len: f64) -> f64 {
        let ratio = if avg_len > 0.0 { doc_len as f64 / avg_len } else { 1.0 };
        self.k1 * ((1.0 - self.b) + self.b * ratio)
    }
}

pub fn idf(num_docs: usize, doc_freq: usize) -> f64 {
    let n = num_docs as f64;
    let n_t = doc_freq as f64;
    ((n - n_t + 0.5) / (n_t + 0.5)).ln()
}

/// Contribution of one term to one document.
pub fn term_score(tf: u32, k: f64, idf: f64) -> f64 {
    let f = tf as f64;
    f / (k + f) * idf
}

/// Score every document matching at least one of `terms`.
///
/// Terms missing from the lexicon contribute nothing. Documents whose total is
/// exactly zero are dropped. Output is sorted by score descending, equal scores
/// by internal id ascending.
pub fn rank<'a, I>(lexicon: &Lexicon, index: &InvertedIndex, docs: &DocTable, terms: I, params: Bm25Params) -> Vec<(DocId, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let num_docs = docs.len();
    let avg_len = docs.average_length();
    let mut scores: HashMap<DocId, f64> = HashMap::new();

    for term in terms {
        let Some(term_id) = lexicon.id(term) else {
            tracing::debug!(term, "query term not in lexicon");
            continue;
        };
        let postings = index.postings(term_id);
        if postings.is_empty() {
            continue;
        }
        let w = idf(num_docs, postings.len());
        for p in postings {
            let k = params.length_norm(docs.length(p.doc_id).unwrap_or(0), avg_len);
            *scores.entry(p.doc_id).or_insert(0.0) += term_score(p.tf, k, w);
        }
    }

    let mut ranked: Vec<(DocId, f64)> = scores.into_iter().filter(|&(_, s)| s != 0.0).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}
