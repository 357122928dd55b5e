use crate::document::{date_dir, DocMeta};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Raw text and metadata for every indexed document, keyed by docno.
///
/// Files live under `<root>/yy/mm/dd/<docno>.{txt,json}`, the directory taken
/// from the date embedded in the docno. The indexer writes; everything else reads.
#[derive(Debug, Clone)]
pub struct DocStore {
    root: PathBuf,
}

impl DocStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn locate(&self, docno: &str) -> Result<(PathBuf, PathBuf)> {
        let dir = date_dir(docno).ok_or_else(|| Error::UnknownDocument(docno.to_string()))?;
        let dir = self.root.join(dir);
        Ok((dir.join(format!("{docno}.txt")), dir.join(format!("{docno}.json"))))
    }

    pub fn put(&self, docno: &str, text: &str, meta: &DocMeta) -> Result<()> {
        let (text_path, meta_path) = self.locate(docno)?;
        if let Some(dir) = text_path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(text_path, text)?;
        fs::write(meta_path, serde_json::to_string_pretty(meta)?)?;
        Ok(())
    }

    pub fn get(&self, docno: &str) -> Result<(String, DocMeta)> {
        let (text_path, meta_path) = self.locate(docno)?;
        if !text_path.exists() || !meta_path.exists() {
            return Err(Error::UnknownDocument(docno.to_string()));
        }
        let text = fs::read_to_string(text_path)?;
        let meta = serde_json::from_str(&fs::read_to_string(meta_path)?)?;
        Ok((text, meta))
    }
}
