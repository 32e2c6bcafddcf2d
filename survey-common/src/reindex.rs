//! Reindexer
//!
//! Serializes every manifest read-modify-write behind one exclusive lock per
//! tag. Upserts run as background tasks spawned after a result file is
//! written, so failures here are logged and swallowed: the manifest is left as
//! it was and the submission itself is already on disk.

use crate::manifest::{manifest_path, ManifestIndex, UpsertOutcome};
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Lock-protected manifest updates for every tag under one storage root
///
/// Each tag lives in `<storage>/<tag>/`, with its manifest at
/// `<storage>/<tag>/<tag>.index.manifest`.
#[derive(Debug)]
pub struct Reindexer {
    storage: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Reindexer {
    pub fn new(storage: impl Into<PathBuf>) -> Self {
        Self {
            storage: storage.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Storage root shared by all tags
    pub fn storage(&self) -> &Path {
        &self.storage
    }

    /// Folder holding a tag's result files and manifest
    pub fn tag_directory(&self, tag: &str) -> PathBuf {
        self.storage.join(tag)
    }

    pub fn manifest_path(&self, tag: &str) -> PathBuf {
        manifest_path(&self.tag_directory(tag), tag)
    }

    async fn tag_lock(&self, tag: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(tag.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Point `client` at `file` in the tag's manifest
    ///
    /// Returns `None` when the manifest could not be read or validated; nothing
    /// is written in that case. A failed write is logged and the outcome is
    /// still returned.
    pub async fn upsert(
        &self,
        tag: &str,
        client: &str,
        file: &str,
        mode: &str,
    ) -> Option<UpsertOutcome> {
        if let Err(e) = validate_tag(tag) {
            error!(tag, "refusing reindex: {}", e);
            return None;
        }
        let lock = self.tag_lock(tag).await;
        let _guard = lock.lock().await;

        let path = self.manifest_path(tag);
        let mut manifest = match ManifestIndex::load_or_default(&path).await {
            Ok(manifest) => manifest,
            Err(e) => {
                error!(tag, path = %path.display(), "unable to read index: {}", e);
                return None;
            }
        };

        let outcome = match manifest.upsert(client, file, mode) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(tag, path = %path.display(), "unable to update index: {}", e);
                return None;
            }
        };
        debug!(tag, client, file, mode, ?outcome, "reindexed");

        if outcome != UpsertOutcome::Kept {
            if let Err(e) = manifest.persist(&path).await {
                error!(tag, path = %path.display(), "manifest writing failure: {}", e);
            }
        }
        Some(outcome)
    }

    /// Run [`upsert`](Self::upsert) as a detached task
    pub fn spawn_upsert(
        self: &Arc<Self>,
        tag: String,
        client: String,
        file: String,
        mode: String,
    ) -> JoinHandle<Option<UpsertOutcome>> {
        let reindexer = Arc::clone(self);
        tokio::spawn(async move { reindexer.upsert(&tag, &client, &file, &mode).await })
    }

    /// Validated copy of the tag's manifest, read under the tag lock
    pub async fn snapshot(&self, tag: &str) -> Result<ManifestIndex> {
        validate_tag(tag)?;
        let lock = self.tag_lock(tag).await;
        let _guard = lock.lock().await;
        let path = self.manifest_path(tag);
        let manifest = ManifestIndex::load_or_default(&path).await?;
        info!(tag, entries = manifest.len(), "manifest snapshot");
        Ok(manifest)
    }
}

/// Tags become folder and file names, so they must be a single path component
pub fn validate_tag(tag: &str) -> Result<()> {
    let valid = !tag.is_empty()
        && tag != "."
        && tag != ".."
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid tag '{}'", tag)))
    }
}
