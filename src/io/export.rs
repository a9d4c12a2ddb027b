//! The aggregation result artifact ("data slice").
//!
//! One `#`-prefixed header line naming the columns, then one space-delimited
//! row per matched run: thirteen numbers in `{:.4e}` form followed by the
//! source directory. Missing presented-pathogen values are written as `NaN`.
//!
//! The reader accepts exactly what the writer produces, so a slice can be
//! re-aggregated later without scanning the run tree again.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::domain::{MeanStd, PerRunStatistics};
use crate::error::AppError;

pub const SLICE_COLUMNS: [&str; 14] = [
    "VAR",
    "VARX",
    "meanAllel",
    "stdAllel",
    "slope",
    "indvMean",
    "indvSTD",
    "meanFitt",
    "stdFitt",
    "meanCvFitt",
    "cvFitSTD",
    "meanPatho",
    "stdPato",
    "sourceDir",
];

/// A row of the slice that could not be read back.
#[derive(Debug, Clone)]
pub struct SliceRowError {
    pub line: usize,
    pub message: String,
}

/// Rows recovered from a slice file plus the rows that were rejected.
#[derive(Debug, Clone, Default)]
pub struct SliceData {
    pub rows: Vec<PerRunStatistics>,
    pub row_errors: Vec<SliceRowError>,
}

/// Write per-run statistics to a slice file.
pub fn write_data_slice(path: &Path, rows: &[PerRunStatistics]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create data slice '{}': {e}", path.display())))?;

    writeln!(file, "# {}", SLICE_COLUMNS.join(" "))
        .map_err(|e| AppError::input(format!("Failed to write data slice header: {e}")))?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_writer(file);

    for r in rows {
        let presented = r.presented_or_missing();
        let numbers = [
            r.var,
            r.varx,
            r.mhc_types.mean,
            r.mhc_types.std,
            r.slope,
            r.individual.mean,
            r.individual.std,
            r.fitness.mean,
            r.fitness.std,
            r.fitness_cv.mean,
            r.fitness_cv.std,
            presented.mean,
            presented.std,
        ];
        let mut record: Vec<String> = numbers.iter().map(|v| format!("{v:.4e}")).collect();
        record.push(r.source_dir.display().to_string());
        writer
            .write_record(&record)
            .map_err(|e| AppError::input(format!("Failed to write data slice row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush data slice: {e}")))?;
    Ok(())
}

/// Read a slice file written by `write_data_slice`.
pub fn read_data_slice(path: &Path) -> Result<SliceData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open data slice '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(file);

    let mut data = SliceData::default();
    for result in reader.records() {
        let (line, parsed) = match result {
            Ok(record) => {
                let line = record.position().map_or(0, |p| p.line() as usize);
                (line, parse_slice_row(&record))
            }
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line() as usize);
                (line, Err(format!("CSV parse error: {e}")))
            }
        };
        match parsed {
            Ok(row) => data.rows.push(row),
            Err(message) => data.row_errors.push(SliceRowError { line, message }),
        }
    }
    Ok(data)
}

fn parse_slice_row(record: &StringRecord) -> Result<PerRunStatistics, String> {
    if record.len() != SLICE_COLUMNS.len() {
        return Err(format!(
            "Expected {} fields, found {}.",
            SLICE_COLUMNS.len(),
            record.len()
        ));
    }

    let mut numbers = [0.0f64; 13];
    for (i, slot) in numbers.iter_mut().enumerate() {
        let raw = record.get(i).unwrap_or_default().trim();
        *slot = raw
            .parse::<f64>()
            .map_err(|_| format!("Invalid `{}` value '{raw}'.", SLICE_COLUMNS[i]))?;
    }
    let pair = |i: usize| MeanStd {
        mean: numbers[i],
        std: numbers[i + 1],
    };

    let presented = pair(11);
    let presented = if presented.mean.is_nan() && presented.std.is_nan() {
        None
    } else {
        Some(presented)
    };

    Ok(PerRunStatistics {
        var: numbers[0],
        varx: numbers[1],
        mhc_types: pair(2),
        slope: numbers[4],
        individual: pair(5),
        fitness: pair(7),
        fitness_cv: pair(9),
        presented,
        source_dir: PathBuf::from(record.get(13).unwrap_or_default()),
    })
}
