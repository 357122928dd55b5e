use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::BTreeSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{Nd}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Porter-family stem of a single lowercase token.
pub fn stem(token: &str) -> String {
    STEMMER.stem(token).into_owned()
}

/// Lowercase `text` and split it into maximal runs of letters and decimal digits.
/// Multiplicity and order are preserved, which the indexer relies on for term counts.
pub fn tokenize(text: &str, stem_tokens: bool) -> Vec<String> {
    let lowered = text.to_lowercase();
    RE.find_iter(&lowered)
        .map(|m| {
            if stem_tokens {
                stem(m.as_str())
            } else {
                m.as_str().to_string()
            }
        })
        .collect()
}

/// Query-side tokenization: same splitting rules as [`tokenize`], de-duplicated.
///
/// A term repeated in the query is counted once, so it never gains extra weight
/// from repetition. Documents are still scored by their own term frequency.
pub fn query_terms(text: &str, stem_tokens: bool) -> BTreeSet<String> {
    tokenize(text, stem_tokens).into_iter().collect()
}
