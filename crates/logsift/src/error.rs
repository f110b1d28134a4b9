//! Error — crate-wide error type.
//!
//! Only configuration problems, sink failures and broken workers reach the
//! caller. Per-file and per-line problems are recovered where they happen
//! (see [`crate::reader::FileFailure`]).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiftError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid prefix filter '{pattern}': {message}")]
    InvalidFilter { pattern: String, message: String },
    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Worker task failed: {0}")]
    WorkerFailed(String),
    #[error("Pipeline has already been run")]
    AlreadyRun,
}

impl SiftError {
    /// True for errors raised before any worker started.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SiftError::Configuration(_)
                | SiftError::InvalidRegex { .. }
                | SiftError::InvalidFilter { .. }
                | SiftError::InvalidGlob { .. }
        )
    }
}

impl From<tokio::task::JoinError> for SiftError {
    fn from(e: tokio::task::JoinError) -> Self {
        SiftError::WorkerFailed(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SiftError>;
