//! Manifest index
//!
//! Each tag keeps one `<tag>.index.manifest` document in its storage folder. It
//! holds three parallel lists (`files`, `clients`, `modes`); position `i` in all
//! three describes the current submission of `clients[i]`.
//!
//! Loading never validates on its own. Call [`ManifestIndex::check`] (or use
//! [`ManifestIndex::load`] / [`read_manifest_file`], which do) before trusting
//! the contents.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mode of an explicit save; only another save may replace it
pub const SAVE_MODE: &str = "save";
/// Mode of a periodic background capture
pub const SNAPSHOT_MODE: &str = "snapshot";
/// Suffix of the manifest file name
pub const MANIFEST_SUFFIX: &str = "index.manifest";

/// Client → current file/mode index for one tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIndex {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub clients: Vec<String>,
    #[serde(default)]
    pub modes: Vec<String>,
}

/// One row of a manifest listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub index: usize,
    pub file: String,
    pub client: String,
    pub mode: String,
}

/// What an upsert did to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Client was new; one entry appended
    Appended,
    /// Existing entry now points at the new file
    Updated,
    /// Existing save left in place
    Kept,
}

impl ManifestIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize without validating
    pub fn from_bytes(contents: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(contents)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Verify that the three lists have equal length
    pub fn check(&self) -> Result<()> {
        if self.files.len() == self.clients.len() && self.files.len() == self.modes.len() {
            return Ok(());
        }
        Err(Error::CorruptIndex {
            files: self.files.len(),
            clients: self.clients.len(),
            modes: self.modes.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Point `client` at `file`, honoring save precedence
    ///
    /// Fails with `CorruptIndex` and leaves the lists untouched when they
    /// disagree on length.
    pub fn upsert(&mut self, client: &str, file: &str, mode: &str) -> Result<UpsertOutcome> {
        self.check()?;
        let outcome = match self.clients.iter().position(|c| c == client) {
            Some(i) => {
                if !supersedes(&self.modes[i], mode) {
                    debug!(client, current = %self.files[i], "keeping saved entry");
                    return Ok(UpsertOutcome::Kept);
                }
                self.files[i] = file.to_string();
                self.modes[i] = mode.to_string();
                UpsertOutcome::Updated
            }
            None => {
                self.clients.push(client.to_string());
                self.files.push(file.to_string());
                self.modes.push(mode.to_string());
                UpsertOutcome::Appended
            }
        };
        Ok(outcome)
    }

    /// Rows for status views, in manifest order
    pub fn entries(&self) -> Vec<ManifestEntry> {
        self.files
            .iter()
            .zip(&self.clients)
            .zip(&self.modes)
            .enumerate()
            .map(|(index, ((file, client), mode))| ManifestEntry {
                index,
                file: file.clone(),
                client: client.clone(),
                mode: mode.clone(),
            })
            .collect()
    }

    /// Read and validate a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read(path)?;
        let manifest = Self::from_bytes(&contents)?;
        manifest.check()?;
        Ok(manifest)
    }

    /// Async variant of [`load`](Self::load); a missing file is the empty index
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            return Ok(Self::new());
        }
        let contents = tokio::fs::read(path).await?;
        let manifest = Self::from_bytes(&contents)?;
        manifest.check()?;
        Ok(manifest)
    }

    /// Write the manifest, replacing any previous file
    pub fn write(&self, path: &Path) -> Result<()> {
        let staged = staging_path(path);
        std::fs::write(&staged, self.to_bytes()?)?;
        std::fs::rename(&staged, path)?;
        Ok(())
    }

    /// Async variant of [`write`](Self::write)
    pub async fn persist(&self, path: &Path) -> Result<()> {
        let staged = staging_path(path);
        tokio::fs::write(&staged, self.to_bytes()?).await?;
        tokio::fs::rename(&staged, path).await?;
        Ok(())
    }
}

/// Whether an incoming `mode` may replace an entry currently in `current`
pub fn supersedes(current: &str, incoming: &str) -> bool {
    current != SAVE_MODE || incoming == SAVE_MODE
}

/// Location of a tag's manifest inside its storage folder
pub fn manifest_path(directory: &Path, tag: &str) -> PathBuf {
    directory.join(format!("{}.{}", tag, MANIFEST_SUFFIX))
}

/// Resolve and read a tag's manifest
///
/// A missing file yields the empty index; unreadable, unparsable and corrupt
/// files are errors.
pub fn read_manifest_file(directory: &Path, tag: &str) -> Result<(PathBuf, ManifestIndex)> {
    let path = manifest_path(directory, tag);
    if !path.exists() {
        return Ok((path, ManifestIndex::new()));
    }
    let manifest = ManifestIndex::load(&path)?;
    Ok((path, manifest))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
