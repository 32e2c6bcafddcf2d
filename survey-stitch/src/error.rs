//! Error types for survey-stitch
//!
//! Every variant aborts the whole aggregation run; there is no partial report.

use std::path::PathBuf;
use thiserror::Error;

/// Aggregation error type
#[derive(Debug, Error)]
pub enum StitchError {
    /// Manifest, export or result folder does not exist
    #[error("missing required input: {}", .0.display())]
    MissingInput(PathBuf),

    /// Output prefix is empty or has no file name
    #[error("invalid output name information: {0}")]
    InvalidOutputName(String),

    /// Manifest points at a result file that does not exist
    #[error("invalid manifest file request {}", .0.display())]
    MissingResult(PathBuf),

    /// Result file shares no positional keys with the export
    #[error("no fields found in {file}")]
    NoFields { file: String },

    /// Manifest has no entries
    #[error("no objects found")]
    NoObjects,

    /// Same client listed twice in one manifest
    #[error("client {0} appears more than once in the manifest")]
    DuplicateClient(String),

    /// Row labels differ from the report header
    #[error("row for {client} does not match the report header")]
    HeaderMismatch { client: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background aggregation task failed to complete
    #[error("aggregation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// survey-common error
    #[error(transparent)]
    Common(#[from] survey_common::Error),
}

/// Result type for aggregation
pub type Result<T> = std::result::Result<T, StitchError>;
