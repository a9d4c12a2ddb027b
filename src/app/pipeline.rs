//! Shared pipeline logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! template -> locate runs -> extract steady state -> sort -> aggregate
//!
//! The subcommands can then focus on presentation (printing vs exports).

use std::path::Path;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::domain::{
    AggregatedStatistics, AggregationMode, CollectConfig, PerRunStatistics, RoleMap, RunDirectory, SkippedRun,
    Template,
};
use crate::error::{AppError, EXIT_NO_DATA};
use crate::extract::extract;
use crate::io::export::{SliceData, read_data_slice};
use crate::io::params::{load_template, read_param_value};
use crate::scan::{RunLocator, locate};

/// All computed outputs of a single `mhca collect` run.
#[derive(Debug, Clone)]
pub struct CollectOutput {
    pub template: Template,
    pub skipped: Vec<SkippedRun>,
    /// Sorted by VAR, VARX, then the MHC statistics.
    pub per_run: Vec<PerRunStatistics>,
    pub aggregated: Vec<AggregatedStatistics>,
}

impl CollectOutput {
    pub fn label(&self) -> &str {
        self.template.axis_label()
    }
}

/// Locate, extract, sort and aggregate.
pub fn run_collect(config: &CollectConfig) -> Result<CollectOutput, AppError> {
    ensure_outside_tree(&config.root, &config.out_dir)?;
    if let Some(summary) = &config.export_summary {
        let dir = summary
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        ensure_outside_tree(&config.root, dir)?;
    }

    let template = load_template(&config.template_path)?;
    let locator = RunLocator::new(&config.root, config.since, template.clone())
        .with_template_file(&config.template_path);

    let located = locate(&locator)?;
    info!(
        root = %config.root.display(),
        matched = located.runs.len(),
        skipped = located.skipped.len(),
        "Scan finished"
    );

    let mut skipped = located.skipped;
    let mut per_run = extract_all(&located.runs, &template.roles, config.steady_window, &mut skipped)?;
    if per_run.is_empty() {
        return Err(AppError::new(
            EXIT_NO_DATA,
            "No runs matching the template and date were found (or all were skipped).",
        ));
    }

    per_run.sort_by(|a, b| a.sort_key_cmp(b));
    let aggregated = aggregate(&per_run, config.mode);

    Ok(CollectOutput {
        template,
        skipped,
        per_run,
        aggregated,
    })
}

/// Refuse an output directory inside the run tree being scanned.
pub fn ensure_outside_tree(root: &Path, out_dir: &Path) -> Result<(), AppError> {
    let tree = root
        .canonicalize()
        .map_err(|e| AppError::input(format!("Run tree root '{}': {e}", root.display())))?;
    let out = out_dir
        .canonicalize()
        .map_err(|e| AppError::input(format!("Output directory '{}': {e}", out_dir.display())))?;
    if out.starts_with(&tree) {
        return Err(AppError::input(format!(
            "Output directory '{}' is inside the run tree '{}'.",
            out_dir.display(),
            root.display()
        )));
    }
    Ok(())
}

/// Extract every located run.
///
/// Runs are processed in parallel but inspected in traversal order, so the
/// first structural error (in that order) is the one reported. Other errors
/// skip their run.
pub fn extract_all(
    runs: &[RunDirectory],
    roles: &RoleMap,
    steady_window: usize,
    skipped: &mut Vec<SkippedRun>,
) -> Result<Vec<PerRunStatistics>, AppError> {
    let results: Vec<Result<PerRunStatistics, AppError>> = runs
        .par_iter()
        .map(|run| extract(run, roles, steady_window))
        .collect();

    let mut out = Vec::with_capacity(results.len());
    for (run, result) in runs.iter().zip(results) {
        match result {
            Ok(stats) => out.push(stats),
            Err(e) if e.is_structural() => return Err(e),
            Err(e) => {
                warn!(dir = %run.path.display(), reason = %e, "Skipping run");
                skipped.push(SkippedRun {
                    dir: run.path.clone(),
                    reason: e.message().to_string(),
                });
            }
        }
    }
    Ok(out)
}

/// Value of one configuration key for every matching run, as `(value, dir)`.
pub fn run_probe(
    root: &Path,
    since: NaiveDate,
    template_path: &Path,
    param: &str,
) -> Result<Vec<(String, String)>, AppError> {
    let template = load_template(template_path)?;
    let locator = RunLocator::new(root, since, template).with_template_file(template_path);
    let located = locate(&locator)?;

    let mut values = Vec::with_capacity(located.runs.len());
    for run in &located.runs {
        let value = match read_param_value(&run.params_file(), param) {
            Ok(Some(v)) => v,
            Ok(None) => "<missing>".to_string(),
            Err(e) => {
                warn!(dir = %run.path.display(), reason = %e, "Cannot read parameter");
                continue;
            }
        };
        values.push((value, run.path.display().to_string()));
    }
    Ok(values)
}

/// Outputs of `mhca summarize`.
#[derive(Debug, Clone)]
pub struct SummarizeOutput {
    pub template: Template,
    pub slice: SliceData,
    pub aggregated: Vec<AggregatedStatistics>,
}

/// Reload a data slice and aggregate it again.
pub fn run_summarize(slice_path: &Path, template_path: &Path, mode: AggregationMode) -> Result<SummarizeOutput, AppError> {
    let template = load_template(template_path)?;
    let data = read_data_slice(slice_path)?;
    for err in &data.row_errors {
        warn!(line = err.line, reason = %err.message, "Skipping data slice row");
    }
    if data.rows.is_empty() {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("No usable rows in data slice '{}'.", slice_path.display()),
        ));
    }
    let aggregated = aggregate(&data.rows, mode);
    Ok(SummarizeOutput {
        template,
        slice: data,
        aggregated,
    })
}
