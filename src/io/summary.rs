//! Aggregated-table hand-off for the rendering layer.
//!
//! The JSON document carries the aggregated rows plus the axis label; the
//! schema is `domain::SummaryFile`. Non-finite numbers (an undefined CI
//! half-width, a column with no data) are written as `null` and read back
//! as NaN.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::domain::{AggregatedStatistics, AggregationMode, SummaryFile};
use crate::error::AppError;

pub fn build_summary(
    label: &str,
    mode: AggregationMode,
    steady_window: Option<usize>,
    rows: &[AggregatedStatistics],
) -> SummaryFile {
    SummaryFile {
        tool: "mhca".to_string(),
        label: label.to_string(),
        mode,
        steady_window,
        rows: rows.to_vec(),
    }
}

/// Write a summary JSON file.
pub fn write_summary_json(path: &Path, summary: &SummaryFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create summary JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::input(format!("Failed to write summary JSON: {e}")))?;

    Ok(())
}

/// Read a summary JSON file written by `write_summary_json`.
pub fn read_summary_json(path: &Path) -> Result<SummaryFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open summary JSON '{}': {e}", path.display())))?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::input(format!("Invalid summary JSON '{}': {e}", path.display())))
}
