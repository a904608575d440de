//! Errors raised while reading the content store

use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a record for a single content file
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("article not found: {0}")]
    NotFound(String),

    #[error("malformed article {path:?}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
