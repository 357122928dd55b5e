//! Extractive, query-biased summaries.
//!
//! Each sentence of more than four words is scored as
//! `2c + 3d + 4k + l` where `c` counts query-term occurrences, `d` counts
//! distinct query terms, `k` is the longest run of consecutive query terms and
//! `l` favours the opening sentences (2 for the first, 1 for the second).

use crate::document::{body_text, strip_markup};
use crate::tokenizer::{query_terms, tokenize};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

pub const DEFAULT_TOP_N: usize = 3;
const MIN_WORDS: usize = 5;

lazy_static! {
    static ref ESCAPES_RE: Regex = Regex::new(r"[\n\\]+").expect("valid regex");
    static ref SENTENCE_END_RE: Regex = Regex::new(r"[.!?]\s+").expect("valid regex");
    static ref SPACES_RE: Regex = Regex::new(r"\s+").expect("valid regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredSentence {
    /// Position among the kept sentences, zero-based.
    pub position: usize,
    pub score: u32,
    pub text: String,
}

/// Sentences of `text` after markup removal, each ending with its punctuation.
pub fn split_sentences(text: &str) -> Vec<String> {
    let cleaned = strip_markup(text);
    let cleaned = ESCAPES_RE.replace_all(&cleaned, " ");
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END_RE.find_iter(&cleaned) {
        sentences.push(cleaned[start..m.start() + 1].to_string());
        start = m.end();
    }
    sentences.push(cleaned[start..].to_string());
    sentences
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| s.split_whitespace().count() >= MIN_WORDS)
        .collect()
}

fn score_sentence(position: usize, sentence: &str, query: &BTreeSet<String>) -> u32 {
    let tokens = tokenize(sentence, false);
    let mut occurrences = 0;
    let mut distinct = HashSet::new();
    let mut run = 0;
    let mut longest_run = 0;
    for token in &tokens {
        if query.contains(token) {
            occurrences += 1;
            distinct.insert(token.as_str());
            run += 1;
            longest_run = longest_run.max(run);
        } else {
            run = 0;
        }
    }
    let lead = match position {
        0 => 2,
        1 => 1,
        _ => 0,
    };
    2 * occurrences + 3 * distinct.len() as u32 + 4 * longest_run + lead
}

/// Every kept sentence with its score, best first; equal scores keep document order.
pub fn rank_sentences(query: &str, text: &str) -> Vec<ScoredSentence> {
    let query = query_terms(query, false);
    let mut scored: Vec<ScoredSentence> = split_sentences(text)
        .into_iter()
        .enumerate()
        .map(|(position, text)| ScoredSentence { position, score: score_sentence(position, &text, &query), text })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score).then(a.position.cmp(&b.position)));
    scored
}

/// Up to `top_n` best sentences joined in score order (not document order).
pub fn summarize(query: &str, text: &str, top_n: usize) -> String {
    let picked: Vec<String> = rank_sentences(query, text).into_iter().take(top_n).map(|s| s.text).collect();
    SPACES_RE.replace_all(picked.join(" ").trim(), " ").into_owned()
}

/// Summary drawn from the `<TEXT>` region of a raw stored record.
pub fn summarize_document(query: &str, raw: &str, top_n: usize) -> String {
    summarize(query, body_text(raw), top_n)
}
