//! Error types shared by the normalizer, index and search layers.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocSearchError>;

#[derive(Error, Debug)]
pub enum DocSearchError {
    #[error("unsupported file format '{extension}': {}", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to extract text from {}: {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("no index found at {}; run with --index first", .0.display())]
    IndexNotFound(PathBuf),

    #[error("invalid query near '{fragment}': {message}")]
    QuerySyntax { fragment: String, message: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocSearchError {
    pub(crate) fn extraction(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        DocSearchError::Extraction { path: path.into(), message: message.to_string() }
    }

    pub(crate) fn syntax(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        DocSearchError::QuerySyntax { fragment: fragment.into(), message: message.into() }
    }

    /// Failures confined to one input document; a batch build skips the
    /// document and carries on.
    pub fn is_per_document(&self) -> bool {
        matches!(self, DocSearchError::UnsupportedFormat { .. } | DocSearchError::Extraction { .. })
    }

    /// Failures caused by user input that should be reported without noise.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, DocSearchError::IndexNotFound(_) | DocSearchError::QuerySyntax { .. })
    }
}
