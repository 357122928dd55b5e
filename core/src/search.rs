use crate::bm25::{self, Bm25Params};
use crate::error::{Error, Result};
use crate::persist::{load_doc_table, load_inverted_index, load_lexicon, load_meta, IndexPaths};
use crate::tokenizer::query_terms;
use crate::{DocId, DocStore, DocTable, InvertedIndex, Lexicon};
use std::path::{Path, PathBuf};

/// Upper bound on results reported per query in run files.
pub const MAX_RESULTS: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub docno: String,
    pub score: f64,
}

/// A loaded, read-only index snapshot. Nothing mutates it after construction,
/// so it can be shared freely between threads.
#[derive(Debug)]
pub struct SearchIndex {
    root: PathBuf,
    lexicon: Lexicon,
    index: InvertedIndex,
    docs: DocTable,
    stemmed: bool,
}

impl SearchIndex {
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let paths = IndexPaths::new(dir.as_ref());
        if !paths.root.is_dir() {
            return Err(Error::MissingArtifact { path: paths.root });
        }
        let meta = load_meta(&paths)?;
        let lexicon = load_lexicon(&paths)?;
        let index = load_inverted_index(&paths)?;
        let docs = load_doc_table(&paths)?;

        if docs.len() != meta.num_docs as usize {
            return Err(Error::CorruptArtifact {
                path: paths.docnos(),
                reason: format!("{} documents listed, meta.json says {}", docs.len(), meta.num_docs),
            });
        }
        if index.num_terms() > lexicon.len() {
            return Err(Error::CorruptArtifact {
                path: paths.inverted_index(),
                reason: format!("postings for {} terms but lexicon has {}", index.num_terms(), lexicon.len()),
            });
        }
        if let Some(max) = index.max_doc_id() {
            if max as usize >= docs.len() {
                return Err(Error::CorruptArtifact {
                    path: paths.inverted_index(),
                    reason: format!("posting references doc {max} of {}", docs.len()),
                });
            }
        }
        tracing::info!(num_docs = docs.len(), num_terms = lexicon.len(), stemmed = meta.stemmed, "index loaded");
        Ok(Self { root: paths.root, lexicon, index, docs, stemmed: meta.stemmed })
    }

    pub fn from_parts<P: AsRef<Path>>(root: P, lexicon: Lexicon, index: InvertedIndex, docs: DocTable, stemmed: bool) -> Self {
        Self { root: root.as_ref().to_path_buf(), lexicon, index, docs, stemmed }
    }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn stemmed(&self) -> bool { self.stemmed }

    pub fn lexicon(&self) -> &Lexicon { &self.lexicon }

    pub fn docs(&self) -> &DocTable { &self.docs }

    /// Raw documents live next to the index artifacts.
    pub fn store(&self) -> DocStore {
        DocStore::new(&self.root)
    }

    /// Every document with a nonzero BM25 score for `query`, best first.
    pub fn rank(&self, query: &str, params: Bm25Params) -> Vec<ScoredDoc> {
        let terms = query_terms(query, self.stemmed);
        bm25::rank(&self.lexicon, &self.index, &self.docs, terms.iter().map(String::as_str), params)
            .into_iter()
            .map(|(doc_id, score)| ScoredDoc {
                doc_id,
                docno: self.docs.docno(doc_id).unwrap_or_default().to_string(),
                score,
            })
            .collect()
    }

    /// [`SearchIndex::rank`] truncated to `limit` results.
    pub fn top(&self, query: &str, params: Bm25Params, limit: usize) -> Vec<ScoredDoc> {
        let mut ranked = self.rank(query, params);
        ranked.truncate(limit);
        ranked
    }
}
