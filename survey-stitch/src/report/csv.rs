//! Tabular CSV report
//!
//! The header comes from the export, not from any client's row, so every row
//! is checked against it before anything is written.

use crate::error::{Result, StitchError};
use crate::stitch::Report;
use std::path::Path;

pub fn write(report: &Report, path: &Path) -> Result<()> {
    for object in &report.result.objects {
        if !object.labels().eq(report.header.iter().map(String::as_str)) {
            return Err(StitchError::HeaderMismatch {
                client: object.client.clone(),
            });
        }
    }

    let mut writer = ::csv::Writer::from_path(path)?;
    writer.write_record(&report.header)?;
    for object in &report.result.objects {
        writer.write_record(object.responses.iter().map(|r| r.answer.as_str()))?;
    }
    writer.flush()?;
    Ok(())
}
