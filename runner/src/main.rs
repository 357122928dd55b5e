mod interactive;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use newsdex_core::eval::{append_average_csv, evaluate, mean, write_measures_csv, Qrels, Results};
use newsdex_core::run::{load_topics, sweep_grid, write_run, Topic};
use newsdex_core::{Bm25Params, Error, SearchIndex};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "runner")]
#[command(about = "Batch BM25 runs, parameter sweeps, evaluation and interactive search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank every topic in a topic file and write a run file
    Run {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long)]
        topics: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 1.2)]
        k1: f64,
        #[arg(long, default_value_t = 0.75)]
        b: f64,
        /// Defaults to newsdexBM25baseline, or newsdexBM25stem for a stemmed index
        #[arg(long)]
        tag: Option<String>,
    },
    /// Write one run per (k1, b) setting of the sweep grid
    Sweep {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long)]
        topics: PathBuf,
        /// Directory receiving bm25-run-{i}.txt
        #[arg(long)]
        output: PathBuf,
    },
    /// Score a run file against relevance judgments
    Measure {
        #[arg(long)]
        qrels: PathBuf,
        #[arg(long)]
        results: PathBuf,
        /// Directory receiving <run_tag>.csv and average_measures.csv
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Query the index from the terminal
    Search {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long, default_value_t = 1.2)]
        k1: f64,
        #[arg(long, default_value_t = 0.75)]
        b: f64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { index, topics, output, k1, b, tag } => run(&index, &topics, &output, Bm25Params::new(k1, b), tag),
        Commands::Sweep { index, topics, output } => sweep(&index, &topics, &output),
        Commands::Measure { qrels, results, output_dir } => measure(&qrels, &results, &output_dir, &mut io::stdout().lock()),
        Commands::Search { index, k1, b } => {
            let index = SearchIndex::load(&index).with_context(|| format!("loading index {}", index.display()))?;
            let stdin = io::stdin();
            interactive::session(&index, Bm25Params::new(k1, b), stdin.lock(), io::stdout().lock())
        }
    }
}

fn default_tag(index: &SearchIndex) -> &'static str {
    if index.stemmed() { "newsdexBM25stem" } else { "newsdexBM25baseline" }
}

fn write_run_file(path: &Path, index: &SearchIndex, topics: &[Topic], params: Bm25Params, tag: &str) -> Result<()> {
    let mut out = BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
    let lines = write_run(&mut out, index, topics, params, tag)?;
    out.flush()?;
    tracing::info!(path = %path.display(), tag, k1 = params.k1, b = params.b, lines, "run written");
    Ok(())
}

fn run(index: &Path, topics: &Path, output: &Path, params: Bm25Params, tag: Option<String>) -> Result<()> {
    let index = SearchIndex::load(index).with_context(|| format!("loading index {}", index.display()))?;
    let topics = load_topics(topics)?;
    let tag = tag.unwrap_or_else(|| default_tag(&index).to_string());
    write_run_file(output, &index, &topics, params, &tag)
}

fn sweep(index: &Path, topics: &Path, output: &Path) -> Result<()> {
    let index = SearchIndex::load(index).with_context(|| format!("loading index {}", index.display()))?;
    let topics = load_topics(topics)?;
    fs::create_dir_all(output)?;
    for (i, params) in sweep_grid().into_iter().enumerate() {
        let n = i + 1;
        write_run_file(&output.join(format!("bm25-run-{n}.txt")), &index, &topics, params, &format!("newsdexBM25run-{n}"))?;
    }
    Ok(())
}

const BAD_FORMAT: &str = "Bad format, can't compute measures for results file";

/// Malformed qrels or results print a single diagnostic and succeed; missing files are errors.
fn measure<W: Write>(qrels: &Path, results: &Path, output_dir: &Path, out: &mut W) -> Result<()> {
    let parsed = Qrels::load(qrels).and_then(|q| Results::load(results).map(|r| (q, r)));
    let (qrels, results) = match parsed {
        Ok(pair) => pair,
        Err(e @ (Error::Qrels { .. } | Error::Results { .. })) => {
            tracing::debug!(error = %e, "unreadable evaluation input");
            writeln!(out, "{BAD_FORMAT}")?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let measures = evaluate(&qrels, &results);
    let avg = mean(&measures);
    fs::create_dir_all(output_dir)?;
    write_measures_csv(output_dir, &results.run_tag, &measures)?;
    append_average_csv(output_dir, &results.run_tag, &avg)?;
    writeln!(
        out,
        "{}: MAP {:.3}  P@10 {:.3}  NDCG@10 {:.3}  NDCG@1000 {:.3}",
        results.run_tag, avg.mean_average_precision, avg.mean_precision_at_10, avg.mean_ndcg_at_10, avg.mean_ndcg_at_1000
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdex_core::indexer::{index_documents, IndexOptions};
    use newsdex_core::parser::CorpusParser;
    use std::io::Cursor;
    use tempfile::{tempdir, TempDir};

    const CORPUS: &str = "<DOC>
<DOCNO> LA010189-0001 </DOCNO>
<TEXT>
<P>
Storm damage closed the coastal highway overnight.
</P>
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010189-0002 </DOCNO>
<TEXT>
<P>
The city library extended its weekend hours.
</P>
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010289-0003 </DOCNO>
<TEXT>
<P>
Farmers reported a strong citrus harvest this winter.
</P>
</TEXT>
</DOC>
";

    fn fixture(options: IndexOptions) -> (TempDir, PathBuf, PathBuf) {
        let dir = tempdir().unwrap();
        let index = dir.path().join("index");
        index_documents(CorpusParser::new(Cursor::new(CORPUS)), &index, options).unwrap();
        let topics = dir.path().join("topics.txt");
        fs::write(&topics, "401\nstorm highway\n402\ncitrus harvest\n").unwrap();
        (dir, index, topics)
    }

    #[test]
    fn sweep_names_files_and_tags_by_position() {
        let (dir, index, topics) = fixture(IndexOptions::default());
        let out = dir.path().join("runs");
        sweep(&index, &topics, &out).unwrap();
        for n in 1..=15 {
            let text = fs::read_to_string(out.join(format!("bm25-run-{n}.txt"))).unwrap();
            let tag = format!("newsdexBM25run-{n}");
            assert!(!text.is_empty());
            assert!(text.lines().all(|l| l.ends_with(&format!(" {tag}"))));
        }
        assert!(!out.join("bm25-run-16.txt").exists());
        let first = fs::read_to_string(out.join("bm25-run-1.txt")).unwrap();
        assert!(first.lines().next().unwrap().starts_with("401 Q0 LA010189-0001 1 "));
    }

    #[test]
    fn run_defaults_tag_from_stemming() {
        let (dir, index, topics) = fixture(IndexOptions { stem: true, sorted_lexicon: false });
        let out = dir.path().join("run.txt");
        run(&index, &topics, &out, Bm25Params::default(), None).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|l| l.ends_with(" newsdexBM25stem")));
    }

    #[test]
    fn measure_reports_bad_format_and_succeeds() {
        let dir = tempdir().unwrap();
        let qrels = dir.path().join("qrels.txt");
        let results = dir.path().join("results.txt");
        fs::write(&qrels, "401 0 LA010189-0001 1\n").unwrap();
        fs::write(&results, "401 Q0 LA010189-0001 one 2.5 myrun\n").unwrap();

        let mut out = Vec::new();
        measure(&qrels, &results, dir.path(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{BAD_FORMAT}\n"));
        assert!(!dir.path().join("average_measures.csv").exists());

        fs::write(&qrels, "401 0 LA010189-0001\n").unwrap();
        fs::write(&results, "401 Q0 LA010189-0001 1 2.5 myrun\n").unwrap();
        let mut out = Vec::new();
        measure(&qrels, &results, dir.path(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{BAD_FORMAT}\n"));
    }

    #[test]
    fn measure_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let results = dir.path().join("results.txt");
        fs::write(&results, "401 Q0 LA010189-0001 1 2.5 myrun\n").unwrap();
        let mut out = Vec::new();
        assert!(measure(&dir.path().join("nope.txt"), &results, dir.path(), &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn measure_writes_csv_outputs() {
        let dir = tempdir().unwrap();
        let qrels = dir.path().join("qrels.txt");
        let results = dir.path().join("results.txt");
        fs::write(&qrels, "401 0 LA010189-0001 1\n").unwrap();
        fs::write(&results, "401 Q0 LA010189-0001 1 2.5 myrun\n").unwrap();
        let out_dir = dir.path().join("measures");
        let mut out = Vec::new();
        measure(&qrels, &results, &out_dir, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("myrun: MAP 1.000"));
        let csv = fs::read_to_string(out_dir.join("myrun.csv")).unwrap();
        assert!(csv.contains("average_precision,401,1.000"));
        assert!(out_dir.join("average_measures.csv").is_file());
    }
}
