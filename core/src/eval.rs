//! Offline effectiveness measures for ranked runs against relevance judgments.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Only the first this-many results of a run are judged.
pub const EVAL_DEPTH: usize = 1000;

/// Relevance judgments: query id -> docno -> grade.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Qrels {
    judgments: BTreeMap<String, HashMap<String, i32>>,
}

impl Qrels {
    /// Lines of `query_id iteration docno relevance`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut judgments: BTreeMap<String, HashMap<String, i32>> = BTreeMap::new();
        for (n, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let bad = |reason: &str| Error::Qrels { line: n + 1, reason: reason.to_string() };
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [query, _iteration, docno, grade] = fields[..] else {
                return Err(bad("expected 4 fields"));
            };
            let grade: i32 = grade.parse().map_err(|_| bad("relevance is not an integer"))?;
            judgments.entry(query.to_string()).or_default().insert(docno.to_string(), grade);
        }
        Ok(Self { judgments })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingArtifact { path: path.to_path_buf() });
        }
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Judged queries in ascending order.
    pub fn query_ids(&self) -> impl Iterator<Item = &str> {
        self.judgments.keys().map(String::as_str)
    }

    /// Unjudged documents count as grade 0.
    pub fn relevance(&self, query: &str, docno: &str) -> i32 {
        self.judgments.get(query).and_then(|j| j.get(docno)).copied().unwrap_or(0)
    }

    /// Grades of the relevant documents for `query`, highest first.
    pub fn ideal_grades(&self, query: &str) -> Vec<i32> {
        let mut grades: Vec<i32> = self
            .judgments
            .get(query)
            .map(|j| j.values().copied().filter(|&g| g > 0).collect())
            .unwrap_or_default();
        grades.sort_unstable_by(|a, b| b.cmp(a));
        grades
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunEntry {
    pub docno: String,
    pub rank: usize,
    pub score: f64,
}

/// A parsed run file. Every line must carry the same run tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Results {
    pub run_tag: String,
    by_query: HashMap<String, Vec<RunEntry>>,
}

impl Results {
    pub fn parse(text: &str) -> Result<Self> {
        let mut run_tag: Option<String> = None;
        let mut by_query: HashMap<String, Vec<RunEntry>> = HashMap::new();
        for (n, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let bad = |reason: &str| Error::Results { line: n + 1, reason: reason.to_string() };
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [query, _q0, docno, rank, score, tag] = fields[..] else {
                return Err(bad("expected 6 fields"));
            };
            let rank: usize = rank.parse().map_err(|_| bad("rank is not an integer"))?;
            let score: f64 = score.parse().map_err(|_| bad("score is not a number"))?;
            if run_tag.get_or_insert_with(|| tag.to_string()).as_str() != tag {
                return Err(bad("run tag differs from earlier lines"));
            }
            by_query.entry(query.to_string()).or_default().push(RunEntry { docno: docno.to_string(), rank, score });
        }
        let run_tag = run_tag.ok_or(Error::Results { line: 0, reason: "no results".into() })?;
        Ok(Self { run_tag, by_query })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingArtifact { path: path.to_path_buf() });
        }
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Results for `query`, by score descending, equal scores by docno descending.
    pub fn ranked(&self, query: &str) -> Option<Vec<&RunEntry>> {
        let entries = self.by_query.get(query)?;
        let mut sorted: Vec<&RunEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| b.docno.cmp(&a.docno)));
        Some(sorted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryMeasures {
    pub query_id: String,
    pub average_precision: f64,
    pub precision_at_10: f64,
    pub ndcg_at_10: f64,
    pub ndcg_at_1000: f64,
}

impl QueryMeasures {
    fn zero(query_id: &str) -> Self {
        Self { query_id: query_id.to_string(), average_precision: 0.0, precision_at_10: 0.0, ndcg_at_10: 0.0, ndcg_at_1000: 0.0 }
    }
}

fn discount(rank_index: usize) -> f64 {
    ((rank_index + 2) as f64).log2()
}

fn dcg(grades: impl Iterator<Item = i32>, depth: usize) -> f64 {
    grades.take(depth).enumerate().map(|(i, g)| g.max(0) as f64 / discount(i)).sum()
}

fn ndcg(actual: &[i32], ideal: &[i32], depth: usize) -> f64 {
    let idcg = dcg(ideal.iter().copied(), depth);
    if idcg > 0.0 { dcg(actual.iter().copied(), depth) / idcg } else { 0.0 }
}

pub fn evaluate_query(qrels: &Qrels, results: &Results, query_id: &str) -> QueryMeasures {
    let Some(ranked) = results.ranked(query_id) else {
        tracing::warn!(query_id, "query has no results but exists in the qrels");
        return QueryMeasures::zero(query_id);
    };
    let grades: Vec<i32> = ranked.iter().take(EVAL_DEPTH).map(|e| qrels.relevance(query_id, &e.docno)).collect();
    let ideal = qrels.ideal_grades(query_id);

    let mut found = 0usize;
    let mut precision_sum = 0.0;
    for (i, &g) in grades.iter().enumerate() {
        if g > 0 {
            found += 1;
            precision_sum += found as f64 / (i + 1) as f64;
        }
    }
    let average_precision = if ideal.is_empty() { 0.0 } else { precision_sum / ideal.len() as f64 };
    let relevant_at_10 = grades.iter().take(10).filter(|&&g| g > 0).count();

    QueryMeasures {
        query_id: query_id.to_string(),
        average_precision,
        precision_at_10: relevant_at_10 as f64 / 10.0,
        ndcg_at_10: ndcg(&grades, &ideal, 10),
        ndcg_at_1000: ndcg(&grades, &ideal, 1000),
    }
}

/// Measures for every judged query, in ascending query id order.
pub fn evaluate(qrels: &Qrels, results: &Results) -> Vec<QueryMeasures> {
    qrels.query_ids().map(|q| evaluate_query(qrels, results, q)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeanMeasures {
    pub mean_average_precision: f64,
    pub mean_precision_at_10: f64,
    pub mean_ndcg_at_10: f64,
    pub mean_ndcg_at_1000: f64,
}

pub fn mean(measures: &[QueryMeasures]) -> MeanMeasures {
    let avg = |f: fn(&QueryMeasures) -> f64| {
        if measures.is_empty() { 0.0 } else { measures.iter().map(f).sum::<f64>() / measures.len() as f64 }
    };
    MeanMeasures {
        mean_average_precision: avg(|m| m.average_precision),
        mean_precision_at_10: avg(|m| m.precision_at_10),
        mean_ndcg_at_10: avg(|m| m.ndcg_at_10),
        mean_ndcg_at_1000: avg(|m| m.ndcg_at_1000),
    }
}

/// `<dir>/<run_tag>.csv` with one `measure,query_id,score` row per query and measure.
pub fn write_measures_csv(dir: &Path, run_tag: &str, measures: &[QueryMeasures]) -> Result<()> {
    let mut out = std::fs::File::create(dir.join(format!("{run_tag}.csv")))?;
    writeln!(out, "measure,query_id,score")?;
    let columns: [(&str, fn(&QueryMeasures) -> f64); 4] = [
        ("average_precision", |m| m.average_precision),
        ("precision_at_10", |m| m.precision_at_10),
        ("ndcg_at_10", |m| m.ndcg_at_10),
        ("ndcg_at_1000", |m| m.ndcg_at_1000),
    ];
    for (name, get) in columns {
        for m in measures {
            writeln!(out, "{name},{},{:.3}", m.query_id, get(m))?;
        }
    }
    Ok(())
}

/// Append one row to `<dir>/average_measures.csv`, writing the header on creation.
pub fn append_average_csv(dir: &Path, run_tag: &str, mean: &MeanMeasures) -> Result<()> {
    let path = dir.join("average_measures.csv");
    let fresh = !path.exists();
    let mut out = OpenOptions::new().create(true).append(true).open(&path)?;
    if fresh {
        writeln!(out, "Run Name,Mean Average Precision,Mean P@10,Mean NDCG@10,Mean NDCG@1000")?;
    }
    writeln!(
        out,
        "{run_tag},{:.3},{:.3},{:.3},{:.3}",
        mean.mean_average_precision, mean.mean_precision_at_10, mean.mean_ndcg_at_10, mean.mean_ndcg_at_1000
    )?;
    Ok(())
}
