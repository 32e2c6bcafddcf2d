//! Common error types for the survey tools

use thiserror::Error;

/// Common result type for survey operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the survey crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON document (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest arrays disagree on length
    #[error("corrupt index ({files} files, {clients} clients, {modes} modes)")]
    CorruptIndex {
        files: usize,
        clients: usize,
        modes: usize,
    },

    /// Result document that cannot be joined against the schema
    #[error("Malformed result: {0}")]
    MalformedResult(String),

    /// Question type outside the known set
    #[error("Unknown question type: {0}")]
    UnknownQuestionType(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
