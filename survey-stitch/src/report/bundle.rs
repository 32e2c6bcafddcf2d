//! Compressed `.tar.gz` bundle of the report documents

use crate::error::{Result, StitchError};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::Path;

/// Pack `members` into `path`, each stored under its base name
pub fn write(members: &[&Path], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut archive = tar::Builder::new(encoder);
    for member in members {
        let name = member
            .file_name()
            .ok_or_else(|| StitchError::InvalidOutputName(member.display().to_string()))?;
        archive.append_path_with_name(member, name)?;
    }
    let encoder = archive.into_inner()?;
    encoder.finish()?.sync_all()?;
    Ok(())
}
