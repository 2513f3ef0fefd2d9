use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while bringing a dataset into memory. The pipeline never sees
/// these: a failed load simply performs no write to the record store.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("dataset is empty")]
    Empty,
    #[error("dataset header is missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("unsupported dataset extension: {0}")]
    UnsupportedFormat(String),
    #[error("dataset load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Rejected `key=value` filter assignment.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("expected key=value, got '{0}'")]
    Malformed(String),
    #[error("unknown filter key '{0}'")]
    UnknownKey(String),
    #[error("invalid value '{value}' for filter '{key}'")]
    InvalidValue { key: String, value: String },
}
