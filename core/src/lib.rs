//! Indexing and BM25 retrieval over an archive of tagged news documents.

pub mod bm25;
pub mod document;
pub mod error;
pub mod eval;
pub mod index;
pub mod indexer;
pub mod lexicon;
pub mod parser;
pub mod persist;
pub mod run;
pub mod search;
pub mod store;
pub mod summary;
pub mod tokenizer;

pub use bm25::Bm25Params;
pub use document::{DocMeta, Document};
pub use error::{Error, Result};
pub use index::{DocTable, InvertedIndex, Posting};
pub use lexicon::Lexicon;
pub use search::{ScoredDoc, SearchIndex, MAX_RESULTS};
pub use store::DocStore;

pub type TermId = u32;
pub type DocId = u32;
