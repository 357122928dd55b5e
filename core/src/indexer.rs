//! Single forward pass from parsed documents to the persisted artifact set.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::parser::open_corpus;
use crate::persist::{save_doc_table, save_inverted_index, save_lexicon, save_meta, IndexMeta, IndexPaths, FORMAT_VERSION};
use crate::tokenizer::tokenize;
use crate::{DocId, DocStore, DocTable, InvertedIndex, Lexicon, TermId};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use time::format_description::well_known::Rfc3339;

const PROGRESS_EVERY: usize = 10_000;

/// In-memory accumulation of lexicon, postings and per-document tables.
/// Documents must be added in arrival order; ids are handed out sequentially.
pub struct IndexBuilder {
    stem: bool,
    lexicon: Lexicon,
    index: InvertedIndex,
    docs: DocTable,
}

impl IndexBuilder {
    pub fn new(stem: bool) -> Self {
        Self { stem, lexicon: Lexicon::new(), index: InvertedIndex::new(), docs: DocTable::new() }
    }

    pub fn add_document(&mut self, doc: &Document) -> DocId {
        let mut tokens = Vec::new();
        for zone in doc.indexable_zones() {
            tokens.extend(tokenize(&zone, self.stem));
        }
        let doc_id = self.docs.push(&doc.docno, tokens.len() as u32);
        debug_assert_eq!(doc_id, doc.internal_id);

        let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
        for token in &tokens {
            *counts.entry(self.lexicon.get_or_insert(token)).or_insert(0) += 1;
        }
        for (term, tf) in counts {
            self.index.append(term, doc_id, tf);
        }
        doc_id
    }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn finish(self) -> (Lexicon, InvertedIndex, DocTable) {
        (self.lexicon, self.index, self.docs)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    pub stem: bool,
    /// Persist the lexicon with ids in term order instead of first-occurrence order.
    pub sorted_lexicon: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    pub num_docs: usize,
    pub num_terms: usize,
    pub num_postings: usize,
}

/// Parse the archive at `corpus` and write a fresh index into `output`.
pub fn build_index(corpus: &Path, output: &Path, options: IndexOptions) -> Result<IndexSummary> {
    let parser = open_corpus(corpus)?;
    index_documents(parser, output, options)
}

/// Index an already-parsed document stream. Any parse error aborts the run;
/// `output` must not exist yet.
pub fn index_documents<I>(docs: I, output: &Path, options: IndexOptions) -> Result<IndexSummary>
where
    I: IntoIterator<Item = Result<Document>>,
{
    if output.exists() {
        return Err(Error::DestinationExists { path: output.to_path_buf() });
    }
    fs::create_dir_all(output)?;
    tracing::info!(output = %output.display(), stem = options.stem, "indexing");

    let paths = IndexPaths::new(output);
    let store = DocStore::new(output);
    let mut builder = IndexBuilder::new(options.stem);
    for doc in docs {
        let doc = doc?;
        store.put(&doc.docno, &doc.raw, &doc.meta())?;
        builder.add_document(&doc);
        if builder.num_docs() % PROGRESS_EVERY == 0 {
            tracing::debug!(num_docs = builder.num_docs(), "progress");
        }
    }

    let (mut lexicon, mut index, docs) = builder.finish();
    if options.sorted_lexicon {
        let (sorted, remap) = lexicon.sorted();
        index = index.remapped(&remap);
        lexicon = sorted;
    }

    save_lexicon(&paths, &lexicon)?;
    save_inverted_index(&paths, &index)?;
    save_doc_table(&paths, &docs)?;
    let meta = IndexMeta {
        num_docs: docs.len() as u32,
        num_terms: lexicon.len() as u32,
        stemmed: options.stem,
        created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
    };
    save_meta(&paths, &meta)?;

    let summary = IndexSummary { num_docs: docs.len(), num_terms: lexicon.len(), num_postings: index.num_postings() };
    tracing::info!(num_docs = summary.num_docs, num_terms = summary.num_terms, num_postings = summary.num_postings, "index build complete");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: DocId, docno: &str, text: &str) -> Document {
        Document {
            docno: docno.into(),
            internal_id: id,
            date: String::new(),
            headline: String::new(),
            raw: format!("<DOC>\n<DOCNO> {docno} </DOCNO>\n<TEXT>\n{text}\n</TEXT>\n</DOC>\n"),
        }
    }

    #[test]
    fn builder_counts_terms() {
        let mut b = IndexBuilder::new(false);
        b.add_document(&doc(0, "LA010189-0001", "Do you quarrel, sir?"));
        b.add_document(&doc(1, "LA010189-0002", "Quarrel sir! no, sir!"));
        let (lex, idx, docs) = b.finish();
        assert_eq!(docs.lengths(), &[4, 4]);
        assert_eq!(lex.len(), 5);
        let sir = lex.id("sir").unwrap();
        assert_eq!(sir, 3);
        let tfs: Vec<(DocId, u32)> = idx.postings(sir).iter().map(|p| (p.doc_id, p.tf)).collect();
        assert_eq!(tfs, vec![(0, 1), (1, 2)]);
        assert_eq!(idx.doc_freq(lex.id("no").unwrap()), 1);
    }

    #[test]
    fn markup_outside_zones_is_not_indexed() {
        let mut b = IndexBuilder::new(false);
        b.add_document(&doc(0, "LA010189-0001", "<P>plain</P>"));
        let (lex, _, docs) = b.finish();
        assert_eq!(lex.id("la010189"), None);
        assert_eq!(lex.id("p"), None);
        assert_eq!(lex.id("plain"), Some(0));
        assert_eq!(docs.length(0), Some(1));
    }
}
