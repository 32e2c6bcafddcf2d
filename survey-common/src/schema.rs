//! Field schema export
//!
//! When a question set loads, its questions are reduced to an ordered list of
//! `{text, type}` pairs and written next to the result files. The stitcher uses
//! that export as a positional lookup table: export index `i` labels the answer
//! stored under key `"i"` in every result document.

use crate::{time, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Prefix of the export file written for each loaded question set
pub const RUN_CONFIG_PREFIX: &str = "run.config";

// ============================================================================
// Question kinds
// ============================================================================

/// Question types a question set may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    Input,
    Hidden,
    Long,
    Option,
    Multiselect,
    Order,
    Label,
    Checkbox,
    Number,
    Image,
    Audio,
    Video,
    HorizontalRule,
    Slide,
    Conditional,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 15] = [
        QuestionKind::Input,
        QuestionKind::Hidden,
        QuestionKind::Long,
        QuestionKind::Option,
        QuestionKind::Multiselect,
        QuestionKind::Order,
        QuestionKind::Label,
        QuestionKind::Checkbox,
        QuestionKind::Number,
        QuestionKind::Image,
        QuestionKind::Audio,
        QuestionKind::Video,
        QuestionKind::HorizontalRule,
        QuestionKind::Slide,
        QuestionKind::Conditional,
    ];

    /// Name used in question sets and exports
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Input => "input",
            QuestionKind::Hidden => "hidden",
            QuestionKind::Long => "long",
            QuestionKind::Option => "option",
            QuestionKind::Multiselect => "multiselect",
            QuestionKind::Order => "order",
            QuestionKind::Label => "label",
            QuestionKind::Checkbox => "checkbox",
            QuestionKind::Number => "number",
            QuestionKind::Image => "image",
            QuestionKind::Audio => "audio",
            QuestionKind::Video => "video",
            QuestionKind::HorizontalRule => "hr",
            QuestionKind::Slide => "slide",
            QuestionKind::Conditional => "conditional",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        QuestionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownQuestionType(s.to_string()))
    }
}

// ============================================================================
// Export
// ============================================================================

/// One exported question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportField {
    pub text: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl ExportField {
    pub fn new(text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            text: text.into(),
            field_type: kind.as_str().to_string(),
        }
    }

    /// Typed view of the exported type name
    pub fn kind(&self) -> Result<QuestionKind> {
        self.field_type.parse()
    }
}

/// Ordered question export for one question set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exports {
    #[serde(default)]
    pub fields: Vec<ExportField>,
}

impl Exports {
    pub fn new(fields: Vec<ExportField>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn from_bytes(contents: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(contents)?)
    }

    /// Read an export file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read(path)?;
        Self::from_bytes(&contents)
    }

    /// Write the export as `run.config.<timestamp>` inside `directory`
    ///
    /// Returns the path that was written so callers can hand it to the stitcher.
    pub fn write_run_config(&self, directory: &Path) -> Result<PathBuf> {
        let path = directory.join(format!("{}.{}", RUN_CONFIG_PREFIX, time::time_string()));
        let datum = serde_json::to_vec(self)?;
        std::fs::write(&path, datum)?;
        info!("running config: {}", path.display());
        Ok(path)
    }
}
