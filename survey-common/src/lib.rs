//! # Survey Common Library
//!
//! Shared code for the survey collection tools including:
//! - Result documents and the field schema export
//! - The per-tag manifest index and its reindexer
//! - The submission store
//! - Configuration loading
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod manifest;
pub mod reindex;
pub mod result;
pub mod schema;
pub mod store;
pub mod time;

pub use error::{Error, Result};
pub use manifest::{ManifestEntry, ManifestIndex, UpsertOutcome};
pub use reindex::Reindexer;
pub use result::{AnswerSet, ResultData};
pub use schema::{ExportField, Exports, QuestionKind};
pub use store::SubmissionStore;
