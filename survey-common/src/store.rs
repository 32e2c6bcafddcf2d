//! Submission store
//!
//! Writes one immutable result document per save event and then hands the new
//! file to the reindexer. The reindex task is only spawned once the document is
//! fully on disk, so a manifest entry never points at a half-written file.

use crate::manifest::UpsertOutcome;
use crate::reindex::{validate_tag, Reindexer};
use crate::result::{ResultData, CLIENT_KEY, TIMESTAMP_KEY};
use crate::{time, Error, Result};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{error, info};

const NONCE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const NONCE_LENGTH: usize = 6;

/// A result document that was written
#[derive(Debug)]
pub struct SavedSubmission {
    /// Manifest file identifier (file name without `.json`)
    pub file: String,
    pub path: PathBuf,
    /// Background reindex of this submission
    pub reindex: JoinHandle<Option<UpsertOutcome>>,
}

/// Result-file writer for one tag
#[derive(Debug, Clone)]
pub struct SubmissionStore {
    reindexer: Arc<Reindexer>,
    tag: String,
}

impl SubmissionStore {
    pub fn new(reindexer: Arc<Reindexer>, tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        validate_tag(&tag)?;
        Ok(Self { reindexer, tag })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn directory(&self) -> PathBuf {
        self.reindexer.tag_directory(&self.tag)
    }

    /// Create the tag folder if it does not exist yet
    pub async fn ensure_directory(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.directory()).await?;
        Ok(())
    }

    /// Persist one submission and schedule its reindex
    pub async fn save(
        &self,
        mut data: ResultData,
        mode: &str,
        client: &str,
        session: &str,
    ) -> Result<SavedSubmission> {
        validate_mode(mode)?;
        let timestamp = time::time_string();
        data.set(CLIENT_KEY, vec![client.to_string()]);
        data.set(TIMESTAMP_KEY, vec![timestamp.clone()]);

        let file = submission_name(&self.tag, &timestamp, mode, client, &nonce(), session);
        let path = self.directory().join(format!("{}.json", file));
        let contents = serde_json::to_vec(&data)?;

        let mut handle = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                error!(path = %path.display(), "error writing json output: {}", e);
                e
            })?;
        handle.write_all(&contents).await?;
        handle.flush().await?;
        drop(handle);

        if mode == crate::manifest::SAVE_MODE {
            info!(tag = %self.tag, "save {}", file);
        }

        let reindex = self.reindexer.spawn_upsert(
            self.tag.clone(),
            client.to_string(),
            file.clone(),
            mode.to_string(),
        );
        Ok(SavedSubmission {
            file,
            path,
            reindex,
        })
    }
}

/// Deterministic file identifier: `<tag>_<timestamp>_<mode>_<name>`
///
/// `name` is the lowercased `client_nonce_session` with everything outside
/// `[a-z0-9_]` removed, so raw addresses and tokens never reach the file system.
pub fn submission_name(
    tag: &str,
    timestamp: &str,
    mode: &str,
    client: &str,
    nonce: &str,
    session: &str,
) -> String {
    let name: String = format!("{}_{}_{}", client, nonce, session)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();
    format!("{}_{}_{}_{}", tag, timestamp, mode, name)
}

/// Random lowercase alphanumeric string mixed into file names
pub fn nonce() -> String {
    let mut rng = rand::thread_rng();
    (0..NONCE_LENGTH)
        .map(|_| NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())] as char)
        .collect()
}

fn validate_mode(mode: &str) -> Result<()> {
    if !mode.is_empty() && mode.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid save mode '{}'", mode)))
    }
}
