//! Structured JSON report

use crate::error::Result;
use crate::stitch::Report;
use std::path::Path;

pub fn write(report: &Report, path: &Path) -> Result<()> {
    let contents = serde_json::to_vec_pretty(&report.result)?;
    std::fs::write(path, contents)?;
    Ok(())
}
