use crate::{DocId, TermId};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Term id -> postings, each list ascending by doc id.
///
/// On disk this is a JSON object from term id to a flat `[doc, tf, doc, tf, ...]` array.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<TermId, Vec<u32>>")]
pub struct InvertedIndex {
    postings: Vec<Vec<Posting>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Postings are appended in document arrival order, so every list stays sorted.
    pub fn append(&mut self, term: TermId, doc_id: DocId, tf: u32) {
        let slot = term as usize;
        if self.postings.len() <= slot {
            self.postings.resize_with(slot + 1, Vec::new);
        }
        let list = &mut self.postings[slot];
        debug_assert!(list.last().map_or(true, |p| p.doc_id < doc_id));
        list.push(Posting { doc_id, tf });
    }

    /// Empty for a term the index has never seen.
    pub fn postings(&self, term: TermId) -> &[Posting] {
        self.postings.get(term as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of documents containing `term`.
    pub fn doc_freq(&self, term: TermId) -> usize {
        self.postings(term).len()
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn num_postings(&self) -> usize {
        self.postings.iter().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &[Posting])> {
        self.postings.iter().enumerate().map(|(id, p)| (id as TermId, p.as_slice()))
    }

    /// Largest doc id referenced by any posting.
    pub fn max_doc_id(&self) -> Option<DocId> {
        self.postings.iter().filter_map(|p| p.last()).map(|p| p.doc_id).max()
    }

    /// Rewrite term ids through `remap` (old id -> new id), e.g. from [`crate::Lexicon::sorted`].
    pub fn remapped(&self, remap: &[TermId]) -> InvertedIndex {
        let mut postings = vec![Vec::new(); self.postings.len()];
        for (old, list) in self.postings.iter().enumerate() {
            postings[remap[old] as usize] = list.clone();
        }
        InvertedIndex { postings }
    }
}

impl TryFrom<BTreeMap<TermId, Vec<u32>>> for InvertedIndex {
    type Error = String;

    fn try_from(flat: BTreeMap<TermId, Vec<u32>>) -> Result<Self, Self::Error> {
        // ids are dense, so every key must fall below the key count
        let num_terms = flat.len();
        let mut index = InvertedIndex::new();
        for (term, values) in flat {
            if term as usize >= num_terms {
                return Err(format!("term id {term} out of range for {num_terms} terms"));
            }
            if values.len() % 2 != 0 {
                return Err(format!("term {term}: odd-length posting list"));
            }
            let mut prev: Option<DocId> = None;
            for pair in values.chunks_exact(2) {
                let (doc_id, tf) = (pair[0], pair[1]);
                if prev.map_or(false, |p| p >= doc_id) {
                    return Err(format!("term {term}: doc ids not ascending at {doc_id}"));
                }
                prev = Some(doc_id);
                index.append(term, doc_id, tf);
            }
        }
        Ok(index)
    }
}

impl Serialize for InvertedIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(term, list)| {
            let flat: Vec<u32> = list.iter().flat_map(|p| [p.doc_id, p.tf]).collect();
            (term, flat)
        }))
    }
}

/// Per-document tables, both indexed by internal id.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DocTable {
    docnos: Vec<String>,
    lengths: Vec<u32>,
}

impl DocTable {
    pub fn new() -> Self { Self::default() }

    pub fn from_parts(docnos: Vec<String>, lengths: Vec<u32>) -> Result<Self, String> {
        if docnos.len() != lengths.len() {
            return Err(format!("{} docnos but {} lengths", docnos.len(), lengths.len()));
        }
        Ok(Self { docnos, lengths })
    }

    /// Append the next document; returns its internal id.
    pub fn push(&mut self, docno: &str, length: u32) -> DocId {
        self.docnos.push(docno.to_string());
        self.lengths.push(length);
        (self.docnos.len() - 1) as DocId
    }

    pub fn len(&self) -> usize { self.docnos.len() }

    pub fn is_empty(&self) -> bool { self.docnos.is_empty() }

    pub fn docno(&self, id: DocId) -> Option<&str> {
        self.docnos.get(id as usize).map(String::as_str)
    }

    pub fn length(&self, id: DocId) -> Option<u32> {
        self.lengths.get(id as usize).copied()
    }

    pub fn docnos(&self) -> &[String] { &self.docnos }

    pub fn lengths(&self) -> &[u32] { &self.lengths }

    /// Arithmetic mean of the length table; 0 for an empty table.
    pub fn average_length(&self) -> f64 {
        if self.lengths.is_empty() {
            return 0.0;
        }
        self.lengths.iter().map(|&l| l as f64).sum::<f64>() / self.lengths.len() as f64
    }
}
