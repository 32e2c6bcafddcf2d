//! On-demand bundling for an administrative caller
//!
//! Takes a consistent snapshot of a tag's manifest under the tag lock, releases
//! the lock, and runs the aggregation against the snapshot into the temp folder.
//! Submissions keep flowing while the report is built; the next bundle picks up
//! whatever changed meanwhile.

use crate::error::Result;
use crate::publish::OutputPaths;
use crate::stitch::{Inputs, LabelStyle};
use std::path::{Path, PathBuf};
use survey_common::{time, Reindexer};
use tracing::{error, info, warn};

/// Which published artifact to hand back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Json,
    Csv,
    Html,
    Bundle,
}

impl Artifact {
    pub fn path<'a>(&self, outputs: &'a OutputPaths) -> &'a Path {
        match self {
            Artifact::Json => outputs.json.as_path(),
            Artifact::Csv => outputs.csv.as_path(),
            Artifact::Html => outputs.html.as_path(),
            Artifact::Bundle => outputs.bundle.as_path(),
        }
    }
}

/// What to bundle
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub tag: String,
    /// Folder receiving the manifest snapshot and the report files
    pub temp: PathBuf,
    /// Field schema export of the running question set
    pub export: PathBuf,
    pub labels: LabelStyle,
    pub read: Option<Artifact>,
}

/// A finished bundle
#[derive(Debug, Clone)]
pub struct BundleOutput {
    pub prefix: PathBuf,
    pub outputs: OutputPaths,
    /// Contents of the requested artifact
    pub contents: Option<Vec<u8>>,
}

/// Build a report for `request.tag`
///
/// Failures are logged; the caller only learns that no report was produced.
pub async fn bundle(reindexer: &Reindexer, request: &BundleRequest) -> Option<BundleOutput> {
    match try_bundle(reindexer, request).await {
        Ok(output) => Some(output),
        Err(e) => {
            error!(tag = %request.tag, "unable to process results: {}", e);
            None
        }
    }
}

async fn try_bundle(reindexer: &Reindexer, request: &BundleRequest) -> Result<BundleOutput> {
    let manifest = reindexer.snapshot(&request.tag).await?;

    let stamp = time::time_string();
    let prefix = request.temp.join(format!("survey.{}", stamp));
    let snapshot_path = request.temp.join(format!("survey.{}.manifest", stamp));
    tokio::fs::create_dir_all(&request.temp).await?;
    manifest.persist(&snapshot_path).await?;
    info!(tag = %request.tag, "result file: {}", prefix.display());

    let inputs = Inputs {
        manifest: snapshot_path.clone(),
        config: request.export.clone(),
        directory: reindexer.tag_directory(&request.tag),
        out_name: prefix.clone(),
        labels: request.labels,
    };
    let processed = tokio::task::spawn_blocking(move || inputs.process()).await;
    if let Err(e) = tokio::fs::remove_file(&snapshot_path).await {
        warn!(path = %snapshot_path.display(), "unable to remove manifest snapshot: {}", e);
    }
    let outputs = processed??;

    let contents = match request.read {
        Some(artifact) => Some(tokio::fs::read(artifact.path(&outputs)).await?),
        None => None,
    };
    Ok(BundleOutput {
        prefix,
        outputs,
        contents,
    })
}
