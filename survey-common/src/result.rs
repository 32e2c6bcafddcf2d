//! Result documents
//!
//! A result document holds one client's answers from one save event:
//! `{"data": {"<key>": ["value", ...]}}`. Decimal keys index into the field
//! schema export; a handful of reserved keys carry submission metadata.
//! [`AnswerSet`] is the typed form the stitcher joins against.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Unique session identifier chosen by the client
pub const SESSION_KEY: &str = "session";
/// Resolved network identity of the submitter
pub const CLIENT_KEY: &str = "client";
/// Capture time of the submission
pub const TIMESTAMP_KEY: &str = "timestamp";
/// Save mode summary (used as a report label, never stored in results)
pub const MODE_KEY: &str = "mode";

/// Raw answers from one submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultData {
    #[serde(rename = "data", default)]
    pub datum: BTreeMap<String, Vec<String>>,
}

impl ResultData {
    pub fn new(datum: BTreeMap<String, Vec<String>>) -> Self {
        Self { datum }
    }

    pub fn from_bytes(contents: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read(path)?;
        Self::from_bytes(&contents)
    }

    /// Replace the values stored under `key`
    pub fn set(&mut self, key: &str, values: Vec<String>) {
        self.datum.insert(key.to_string(), values);
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.datum.get(key).map(Vec::as_slice)
    }
}

/// Answers of one result document, indexed by export position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSet {
    answers: Vec<Option<Vec<String>>>,
    client: Vec<String>,
    session: Vec<String>,
    timestamp: Vec<String>,
}

impl AnswerSet {
    /// Split `data` into reserved values and positional answers
    ///
    /// Every non-reserved key must be a decimal index below `field_count`.
    pub fn parse(data: &ResultData, field_count: usize) -> Result<Self> {
        let mut set = AnswerSet {
            answers: vec![None; field_count],
            client: Vec::new(),
            session: Vec::new(),
            timestamp: Vec::new(),
        };
        for (key, values) in &data.datum {
            match key.as_str() {
                CLIENT_KEY => set.client = values.clone(),
                SESSION_KEY => set.session = values.clone(),
                TIMESTAMP_KEY => set.timestamp = values.clone(),
                _ => {
                    let index = parse_index(key)?;
                    let slot = set.answers.get_mut(index).ok_or_else(|| {
                        Error::MalformedResult(format!(
                            "answer key {} is outside the {} exported fields",
                            key, field_count
                        ))
                    })?;
                    if slot.is_some() {
                        return Err(Error::MalformedResult(format!(
                            "answer index {} appears more than once",
                            index
                        )));
                    }
                    *slot = Some(values.clone());
                }
            }
        }
        Ok(set)
    }

    /// Values answered for export position `index`
    pub fn answer(&self, index: usize) -> Option<&[String]> {
        self.answers.get(index).and_then(|a| a.as_deref())
    }

    /// Number of export positions that have an entry
    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn field_count(&self) -> usize {
        self.answers.len()
    }

    pub fn client(&self) -> &[String] {
        &self.client
    }

    pub fn session(&self) -> &[String] {
        &self.session
    }

    pub fn timestamp(&self) -> &[String] {
        &self.timestamp
    }
}

fn parse_index(key: &str) -> Result<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedResult(format!(
            "unexpected answer key '{}'",
            key
        )));
    }
    key.parse::<usize>()
        .map_err(|e| Error::MalformedResult(format!("answer key '{}': {}", key, e)))
}
