//! Topic files in, TREC-style ranked run files out.

use crate::error::{Error, Result};
use crate::search::{ScoredDoc, SearchIndex, MAX_RESULTS};
use crate::Bm25Params;
use std::fmt;
use std::io::Write;
use std::path::Path;

pub const SWEEP_K1: [f64; 5] = [1.0, 1.2, 1.4, 1.6, 1.8];
pub const SWEEP_B: [f64; 3] = [0.0, 0.5, 1.0];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub query: String,
}

/// Topic files alternate a topic-id line and a query line, paired by position.
/// Trailing blank lines are ignored; a blank query line is a query with no terms.
pub fn parse_topics(text: &str) -> Result<Vec<Topic>> {
    let mut lines: Vec<&str> = text.lines().map(str::trim).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let mut topics = Vec::with_capacity(lines.len() / 2);
    for (i, pair) in lines.chunks(2).enumerate() {
        let line = 2 * i + 1;
        match pair {
            [id, query] if !id.is_empty() => topics.push(Topic { id: id.to_string(), query: query.to_string() }),
            _ => return Err(Error::TopicFile { line }),
        }
    }
    Ok(topics)
}

pub fn load_topics(path: &Path) -> Result<Vec<Topic>> {
    if !path.exists() {
        return Err(Error::MissingArtifact { path: path.to_path_buf() });
    }
    parse_topics(&std::fs::read_to_string(path)?)
}

/// One line of a run file: `topic_id Q0 docno rank score run_tag`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunLine {
    pub topic_id: String,
    pub docno: String,
    pub rank: usize,
    pub score: f64,
    pub tag: String,
}

impl fmt::Display for RunLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Q0 {} {} {} {}", self.topic_id, self.docno, self.rank, self.score, self.tag)
    }
}

/// Ranks start at 1; at most [`MAX_RESULTS`] lines.
pub fn run_lines(topic_id: &str, ranked: &[ScoredDoc], tag: &str) -> Vec<RunLine> {
    ranked
        .iter()
        .take(MAX_RESULTS)
        .enumerate()
        .map(|(i, d)| RunLine {
            topic_id: topic_id.to_string(),
            docno: d.docno.clone(),
            rank: i + 1,
            score: d.score,
            tag: tag.to_string(),
        })
        .collect()
}

/// Rank every topic and write the run. Returns the number of lines written.
pub fn write_run<W: Write>(out: &mut W, index: &SearchIndex, topics: &[Topic], params: Bm25Params, tag: &str) -> Result<usize> {
    let mut written = 0;
    for topic in topics {
        let ranked = index.top(&topic.query, params, MAX_RESULTS);
        tracing::debug!(topic = %topic.id, hits = ranked.len(), "ranked");
        for line in run_lines(&topic.id, &ranked, tag) {
            writeln!(out, "{line}")?;
            written += 1;
        }
    }
    Ok(written)
}

/// k1-major grid of parameter settings, numbered from 1 in the order returned.
pub fn sweep_grid() -> Vec<Bm25Params> {
    SWEEP_K1
        .iter()
        .flat_map(|&k1| SWEEP_B.iter().map(move |&b| Bm25Params::new(k1, b)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_alternate() {
        let topics = parse_topics("401\nforeign minorities, Germany\n402\nbehavioral genetics\n\n\n").unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0], Topic { id: "401".into(), query: "foreign minorities, Germany".into() });
        assert_eq!(topics[1].id, "402");
    }

    #[test]
    fn empty_query_line_keeps_pairing() {
        let topics = parse_topics("401\n\n402\nsecond query\n403\nthird query\n").unwrap();
        let ids: Vec<&str> = topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["401", "402", "403"]);
        assert_eq!(topics[0].query, "");
        assert_eq!(topics[1].query, "second query");
    }

    #[test]
    fn dangling_topic_id() {
        assert!(matches!(parse_topics("401\nquery\n402\n"), Err(Error::TopicFile { line: 3 })));
        assert!(matches!(
            parse_topics("401\n\n402\nsecond query\n403\nthird query\n404\n"),
            Err(Error::TopicFile { line: 7 })
        ));
    }

    #[test]
    fn blank_topic_id() {
        assert!(matches!(parse_topics("401\nquery\n\nquery two\n"), Err(Error::TopicFile { line: 3 })));
    }

    #[test]
    fn run_line_format() {
        let ranked = vec![
            ScoredDoc { doc_id: 4, docno: "LA010189-0005".into(), score: 3.5 },
            ScoredDoc { doc_id: 1, docno: "LA010189-0002".into(), score: -0.25 },
        ];
        let lines: Vec<String> = run_lines("401", &ranked, "tag").iter().map(|l| l.to_string()).collect();
        assert_eq!(lines, vec!["401 Q0 LA010189-0005 1 3.5 tag", "401 Q0 LA010189-0002 2 -0.25 tag"]);
    }

    #[test]
    fn run_is_truncated() {
        let ranked: Vec<ScoredDoc> = (0..1500)
            .map(|i| ScoredDoc { doc_id: i, docno: format!("LA010189-{i:04}"), score: 1.0 })
            .collect();
        let lines = run_lines("1", &ranked, "t");
        assert_eq!(lines.len(), MAX_RESULTS);
        assert_eq!(lines.last().unwrap().rank, MAX_RESULTS);
    }

    #[test]
    fn grid_order() {
        let grid = sweep_grid();
        assert_eq!(grid.len(), 15);
        assert_eq!(grid[0], Bm25Params::new(1.0, 0.0));
        assert_eq!(grid[1], Bm25Params::new(1.0, 0.5));
        assert_eq!(grid[14], Bm25Params::new(1.8, 1.0));
    }
}
