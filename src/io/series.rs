//! Whitespace-delimited time-series tables written by the simulator.
//!
//! Every file has a `#`-prefixed header line and one row per recorded host
//! generation, time in the first column. Blank lines are ignored. Values are
//! parsed as `f64` (integer columns included).

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

/// Columns of `HostsGeneDivers.csv`, one entry per generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiversitySeries {
    pub time: Vec<f64>,
    pub pop_size: Vec<f64>,
    pub total_genes: Vec<f64>,
    pub mhc_types: Vec<f64>,
    pub shannon: Vec<f64>,
    pub mean_fitness: Vec<f64>,
    pub std_fitness: Vec<f64>,
}

pub const DIVERSITY_COLUMNS: usize = 7;

impl DiversitySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    fn push_row(&mut self, row: &[f64]) {
        self.time.push(row[0]);
        self.pop_size.push(row[1]);
        self.total_genes.push(row[2]);
        self.mhc_types.push(row[3]);
        self.shannon.push(row[4]);
        self.mean_fitness.push(row[5]);
        self.std_fitness.push(row[6]);
    }
}

/// A time-indexed matrix: first column time, then one value per individual.
///
/// Rows may differ in length when the population size changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountMatrix {
    pub rows: Vec<Vec<f64>>,
}

impl CountMatrix {
    /// All per-individual values (time column dropped) from row `start` on.
    pub fn values_from(&self, start: usize) -> Vec<f64> {
        self.rows
            .iter()
            .skip(start)
            .flat_map(|row| row.iter().skip(1).copied())
            .collect()
    }
}

/// Load the population diversity table.
pub fn load_diversity(path: &Path) -> Result<DiversitySeries, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open '{}': {e}", path.display()))?;
    let mut series = DiversitySeries::default();
    for (line_no, row) in read_rows(BufReader::new(file), path)? {
        if row.len() < DIVERSITY_COLUMNS {
            return Err(format!(
                "'{}' line {line_no}: expected {DIVERSITY_COLUMNS} columns, found {}.",
                path.display(),
                row.len()
            ));
        }
        series.push_row(&row);
    }
    if series.is_empty() {
        return Err(format!("'{}' has no data rows.", path.display()));
    }
    Ok(series)
}

/// Load a per-individual count matrix.
pub fn load_matrix(path: &Path) -> Result<CountMatrix, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open '{}': {e}", path.display()))?;
    matrix_from_reader(BufReader::new(file), path)
}

/// Like `load_matrix`, but a missing file is `Ok(None)` rather than an error.
pub fn load_optional_matrix(path: &Path) -> Result<Option<CountMatrix>, String> {
    match File::open(path) {
        Ok(file) => matrix_from_reader(BufReader::new(file), path).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(format!("Failed to open '{}': {e}", path.display())),
    }
}

fn matrix_from_reader(reader: impl BufRead, path: &Path) -> Result<CountMatrix, String> {
    let rows = read_rows(reader, path)?
        .into_iter()
        .map(|(_, row)| row)
        .collect();
    Ok(CountMatrix { rows })
}

/// Parse every data line into numbers, keeping 1-based line numbers for errors.
fn read_rows(reader: impl BufRead, path: &Path) -> Result<Vec<(usize, Vec<f64>)>, String> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| format!("Failed to read '{}': {e}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let row = trimmed
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>()
                    .map_err(|_| format!("'{}' line {line_no}: invalid number '{tok}'.", path.display()))
            })
            .collect::<Result<Vec<f64>, String>>()?;
        rows.push((line_no, row));
    }
    Ok(rows)
}
