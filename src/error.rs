//! Module defining the errors which are exposed to the users of the crate

use std::path::PathBuf;

use crate::{cipher::CipherError, storage::RepositoryError};

/// Failures at the boundary of a batch run. Per-line failures never surface here, they end up
/// in the error report instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input file could not be read or an artifact could not be written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML serialization error: {0}")]
    Xml(String),

    /// The repository could not be queried after ingestion
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub(crate) fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
    Error::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn config_error(message: impl Into<String>) -> Error {
    Error::Config(message.into())
}
