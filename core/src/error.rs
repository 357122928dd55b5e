use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("required path does not exist: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("destination already exists, refusing to overwrite: {}", path.display())]
    DestinationExists { path: PathBuf },

    /// A `<DOCNO>` line whose content does not look like `XX000000-0000`.
    #[error("line {line}: malformed docno in {text:?}")]
    MalformedDocno { line: usize, text: String },

    #[error("line {line}: document closed without a docno")]
    MissingDocno { line: usize },

    #[error("corpus ended inside an open document")]
    UnterminatedDocument,

    #[error("corrupt artifact {}: {reason}", path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    #[error("unknown document: {0}")]
    UnknownDocument(String),

    #[error("topic file line {line}: expected a topic id followed by a query line")]
    TopicFile { line: usize },

    #[error("qrels line {line}: {reason}")]
    Qrels { line: usize, reason: String },

    #[error("results line {line}: {reason}")]
    Results { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
