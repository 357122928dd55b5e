use crate::error::{Error, Result};
use crate::{DocTable, InvertedIndex, Lexicon};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub num_docs: u32,
    pub num_terms: u32,
    /// Whether terms were stemmed at build time; queries must match.
    pub stemmed: bool,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn lexicon(&self) -> PathBuf { self.root.join("lexicon.json") }
    pub fn inverted_index(&self) -> PathBuf { self.root.join("inverted-index.json") }
    pub fn doc_lengths(&self) -> PathBuf { self.root.join("doc-lengths.txt") }
    pub fn docnos(&self) -> PathBuf { self.root.join("docnos.txt") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        return Err(Error::MissingArtifact { path: path.to_path_buf() });
    }
    Ok(BufReader::new(File::open(path)?))
}

fn corrupt(path: &Path, reason: impl ToString) -> Error {
    Error::CorruptArtifact { path: path.to_path_buf(), reason: reason.to_string() }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut w, value)?;
    w.flush()?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    serde_json::from_reader(open(path)?).map_err(|e| corrupt(path, e))
}

fn save_lines<I, T>(path: &Path, items: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let mut w = BufWriter::new(File::create(path)?);
    for item in items {
        writeln!(w, "{item}")?;
    }
    w.flush()?;
    Ok(())
}

fn load_lines(path: &Path) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in open(path)?.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

pub fn save_lexicon(paths: &IndexPaths, lexicon: &Lexicon) -> Result<()> {
    save_json(&paths.lexicon(), lexicon)
}

pub fn load_lexicon(paths: &IndexPaths) -> Result<Lexicon> {
    load_json(&paths.lexicon())
}

pub fn save_inverted_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    save_json(&paths.inverted_index(), index)
}

pub fn load_inverted_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    load_json(&paths.inverted_index())
}

/// Writes `docnos.txt` and `doc-lengths.txt`, one entry per line in internal id order.
pub fn save_doc_table(paths: &IndexPaths, docs: &DocTable) -> Result<()> {
    save_lines(&paths.docnos(), docs.docnos())?;
    save_lines(&paths.doc_lengths(), docs.lengths())
}

pub fn load_doc_table(paths: &IndexPaths) -> Result<DocTable> {
    let docnos = load_lines(&paths.docnos())?;
    let lengths_path = paths.doc_lengths();
    let lengths = load_lines(&lengths_path)?
        .iter()
        .map(|l| l.parse::<u32>().map_err(|e| corrupt(&lengths_path, format!("{l:?}: {e}"))))
        .collect::<Result<Vec<u32>>>()?;
    DocTable::from_parts(docnos, lengths).map_err(|e| corrupt(&paths.root, e))
}

pub fn save_meta(paths: &IndexPaths, meta: &IndexMeta) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    std::fs::write(paths.meta(), json)?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<IndexMeta> {
    load_json(&paths.meta())
}
