//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add import/config concerns.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Wrong file extension or unparseable document. Raised before any
    /// write for the affected file.
    #[error("import format error in {path}: {message}")]
    ImportFormat { path: PathBuf, message: String },

    /// A required reference (parent uid, grouping code) is missing or
    /// duplicated within one import run. Aborts the remainder of the file;
    /// earlier saves from the same file stay committed.
    #[error("import integrity error: {message}")]
    ImportIntegrity { message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    pub fn import_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ImportFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn import_integrity(message: impl Into<String>) -> Self {
        Self::ImportIntegrity {
            message: message.into(),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
