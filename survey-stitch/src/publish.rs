//! Staged publication of report files
//!
//! All artifacts are first written into a private staging folder next to the
//! output prefix. Only when every artifact succeeded are they renamed into
//! place, bundle last, so a present `.tar.gz` means the other three files of
//! that run are complete. A failed publish removes whatever it already moved.

use crate::error::{Result, StitchError};
use crate::report;
use crate::stitch::Report;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Final locations of the four report artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub html: PathBuf,
    pub bundle: PathBuf,
}

impl OutputPaths {
    /// Derive the artifact paths from an output prefix
    pub fn from_prefix(prefix: &Path) -> Result<Self> {
        let base = prefix
            .file_name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StitchError::InvalidOutputName(prefix.display().to_string()))?;
        let parent = match prefix.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self::in_directory(&parent, base.to_os_string()))
    }

    fn in_directory(directory: &Path, base: OsString) -> Self {
        let with = |ext: &str| {
            let mut name = base.clone();
            name.push(ext);
            directory.join(name)
        };
        Self {
            json: with(".json"),
            csv: with(".csv"),
            html: with(".html"),
            bundle: with(".tar.gz"),
        }
    }

    /// Same base names inside another folder
    fn staged_in(&self, staging: &Path) -> Result<Self> {
        let base = self
            .json
            .file_stem()
            .ok_or_else(|| StitchError::InvalidOutputName(self.json.display().to_string()))?;
        Ok(Self::in_directory(staging, base.to_os_string()))
    }

    /// Publication order; the bundle comes last
    pub fn all(&self) -> [&Path; 4] {
        [
            self.json.as_path(),
            self.csv.as_path(),
            self.html.as_path(),
            self.bundle.as_path(),
        ]
    }

    pub fn directory(&self) -> &Path {
        self.json.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Removes the staging folder however the run ends
struct StagingDir(PathBuf);

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.0.display(), "unable to remove staging folder: {}", e);
            }
        }
    }
}

/// Write all report artifacts and publish them together
pub fn save(report: &Report, outputs: &OutputPaths) -> Result<()> {
    let directory = outputs.directory();
    let staging = StagingDir(directory.join(format!(".stitch-staging-{}", uuid::Uuid::new_v4())));
    std::fs::create_dir(&staging.0)?;

    let staged = outputs.staged_in(&staging.0)?;
    report::json::write(report, &staged.json)?;
    report::csv::write(report, &staged.csv)?;
    report::html::write(report, &staged.html)?;
    report::bundle::write(
        &[
            staged.html.as_path(),
            staged.csv.as_path(),
            staged.json.as_path(),
        ],
        &staged.bundle,
    )?;
    debug!(staging = %staging.0.display(), "report staged");

    // The bundle marks a complete set; a stale one must not outlive a partial rename
    remove_if_present(&outputs.bundle)?;

    let mut published: Vec<&Path> = Vec::with_capacity(4);
    for (from, to) in staged.all().into_iter().zip(outputs.all()) {
        if let Err(e) = std::fs::rename(from, to) {
            for done in published {
                if let Err(cleanup) = std::fs::remove_file(done) {
                    warn!(path = %done.display(), "unable to roll back published file: {}", cleanup);
                }
            }
            return Err(e.into());
        }
        published.push(to);
    }
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_prefix() {
        let paths = OutputPaths::from_prefix(Path::new("/tmp/out/survey.2024")).unwrap();
        assert_eq!(paths.json, PathBuf::from("/tmp/out/survey.2024.json"));
        assert_eq!(paths.csv, PathBuf::from("/tmp/out/survey.2024.csv"));
        assert_eq!(paths.html, PathBuf::from("/tmp/out/survey.2024.html"));
        assert_eq!(paths.bundle, PathBuf::from("/tmp/out/survey.2024.tar.gz"));
        assert_eq!(paths.directory(), Path::new("/tmp/out"));
    }

    #[test]
    fn test_bare_prefix_uses_current_directory() {
        let paths = OutputPaths::from_prefix(Path::new("report")).unwrap();
        assert_eq!(paths.json, PathBuf::from("./report.json"));
    }

    #[test]
    fn test_empty_prefix_is_invalid() {
        assert!(matches!(
            OutputPaths::from_prefix(Path::new("")),
            Err(StitchError::InvalidOutputName(_))
        ));
        assert!(OutputPaths::from_prefix(Path::new("/")).is_err());
    }

    #[test]
    fn test_remove_if_present_ignores_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.tar.gz");
        remove_if_present(&path).unwrap();

        std::fs::write(&path, b"old").unwrap();
        remove_if_present(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_staged_paths_keep_base_names() {
        let paths = OutputPaths::from_prefix(Path::new("/out/run.a")).unwrap();
        let staged = paths.staged_in(Path::new("/stage")).unwrap();
        assert_eq!(staged.json, PathBuf::from("/stage/run.a.json"));
        assert_eq!(staged.bundle, PathBuf::from("/stage/run.a.tar.gz"));
    }
}
