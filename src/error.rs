//! Error types for the qpong crate

use thiserror::Error;

/// Main error type for the qpong crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid action {action} (expected -1, 0, or 1)")]
    InvalidAction { action: i32 },

    #[error("action {action} is not in this agent's action set")]
    UnknownAction { action: i32 },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("unsupported Q-table format version {version} (expected {expected})")]
    UnsupportedVersion { version: u32, expected: u32 },

    #[error("saved action set {got:?} does not match configured actions {expected:?}")]
    ActionSetMismatch { expected: Vec<i32>, got: Vec<i32> },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
