use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use newsdex_core::indexer::{build_index, IndexOptions};
use newsdex_core::persist::{load_doc_table, IndexPaths};
use newsdex_core::{DocId, DocStore, Error};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a BM25 index over a gzipped news archive and fetch stored documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Lookup {
    /// Look up by docno, e.g. LA010189-0001
    Docno,
    /// Look up by internal id
    Id,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the archive and write the index and document store
    Build {
        /// Archive path (.gz, or plain text)
        #[arg(long)]
        input: PathBuf,
        /// Index directory; must not exist yet
        #[arg(long)]
        output: PathBuf,
        /// Apply Porter stemming to indexed tokens
        #[arg(long, default_value_t = false)]
        stem: bool,
        /// Persist term ids in ascending term order
        #[arg(long, default_value_t = false)]
        sorted_lexicon: bool,
    },
    /// Print a stored document with its metadata
    GetDoc {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(value_enum)]
        by: Lookup,
        value: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stem, sorted_lexicon } => {
            let summary = build_index(&input, &output, IndexOptions { stem, sorted_lexicon })
                .with_context(|| format!("indexing {} into {}", input.display(), output.display()))?;
            println!(
                "indexed {} documents, {} terms, {} postings into {}",
                summary.num_docs,
                summary.num_terms,
                summary.num_postings,
                output.display()
            );
            Ok(())
        }
        Commands::GetDoc { index, by, value } => get_doc(&index, by, &value, &mut io::stdout().lock()),
    }
}

/// Resolve `value` to a docno (directly, or through the docno table for an internal id).
fn resolve_docno(index: &Path, by: Lookup, value: &str) -> Result<String> {
    Ok(match by {
        Lookup::Docno => value.to_string(),
        Lookup::Id => {
            let id: DocId = value.parse().with_context(|| format!("internal id must be a number, got {value:?}"))?;
            let docs = load_doc_table(&IndexPaths::new(index))?;
            docs.docno(id).ok_or_else(|| Error::UnknownDocument(value.to_string()))?.to_string()
        }
    })
}

fn get_doc<W: Write>(index: &Path, by: Lookup, value: &str, out: &mut W) -> Result<()> {
    let docno = resolve_docno(index, by, value)?;
    tracing::debug!(%docno, "fetching document");
    let (raw, meta) = DocStore::new(index).get(&docno)?;
    writeln!(out, "docno: {}", meta.docno)?;
    writeln!(out, "internal id: {}", meta.internal_id)?;
    writeln!(out, "date: {}", meta.date)?;
    writeln!(out, "headline: {}", meta.headline)?;
    writeln!(out, "raw document:")?;
    write!(out, "{raw}")?;
    Ok(())
}
