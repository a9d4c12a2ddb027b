//! Formatted terminal output.
//!
//! We keep formatting code in one place so the scan/extract/aggregate code
//! stays free of presentation concerns.

use crate::domain::{AggregatedStatistics, AggregationMode, PerRunStatistics, SkippedRun};

/// Header block for a `collect` run.
pub fn format_run_summary(
    label: &str,
    matched: usize,
    skipped: &[SkippedRun],
    steady_window: usize,
    slice_path: Option<&str>,
) -> String {
    let mut out = String::new();

    out.push_str("=== mhca - steady-state MHC aggregation ===\n");
    out.push_str(&format!("Axis label: {label}\n"));
    out.push_str(&format!("Steady window: last {steady_window} generations\n"));
    out.push_str(&format!("Runs: matched={matched} skipped={}\n", skipped.len()));
    for skip in skipped {
        out.push_str(&format!("  (skipped {}) {}\n", skip.dir.display(), skip.reason));
    }
    if let Some(path) = slice_path {
        out.push_str(&format!("Data slice: {path}\n"));
    }
    out.push('\n');

    out
}

/// Per-run table (one line per matched run).
pub fn format_per_run(rows: &[PerRunStatistics]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>10} {:>10} {:>10} {:>10} {:>11} {:>9} {:>9} {:>10} {:>10} {:<}\n",
            "VAR", "VARX", "mhc", "mhc_std", "slope", "indv", "indv_std", "fitness", "presented", "dir"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:->10} {:->10} {:->10} {:->10} {:->11} {:->9} {:->9} {:->10} {:->10} {:-<3}\n",
            "", "", "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        let presented = r.presented.map_or_else(|| "n/a".to_string(), |p| fmt_num(p.mean));
        out.push_str(
            format!(
                "{:>10} {:>10} {:>10} {:>10} {:>11.3e} {:>9} {:>9} {:>10} {:>10} {}\n",
                fmt_num(r.var),
                fmt_num(r.varx),
                fmt_num(r.mhc_types.mean),
                fmt_num(r.mhc_types.std),
                r.slope,
                fmt_num(r.individual.mean),
                fmt_num(r.individual.std),
                fmt_num(r.fitness.mean),
                presented,
                r.source_dir.display(),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Aggregated table: `central ± dispersion` per quantity.
pub fn format_aggregated(rows: &[AggregatedStatistics], mode: AggregationMode) -> String {
    let mut out = String::new();
    out.push_str(&format!("Aggregated ({}):\n", mode.dispersion_label()));
    out.push_str(
        format!(
            "{:>10} {:>10} {:>4} {:>20} {:>20} {:>20} {:>20} {:>20}\n",
            "VAR", "VARX", "n", "mhc", "indv", "fitness", "cv_fitness", "presented"
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:>10} {:>10} {:>4} {:>20} {:>20} {:>20} {:>20} {:>20}\n",
                fmt_num(r.var),
                fmt_num(r.varx),
                r.n_runs,
                fmt_pm(r.mhc_types.central, r.mhc_types.dispersion),
                fmt_pm(r.individual.central, r.individual.dispersion),
                fmt_pm(r.fitness.central, r.fitness.dispersion),
                fmt_pm(r.fitness_cv.central, r.fitness_cv.dispersion),
                fmt_pm(r.presented.central, r.presented.dispersion),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// `probe` output: one parameter value per matched run.
pub fn format_probe(param: &str, values: &[(String, String)]) -> String {
    let mut out = String::new();
    for (value, dir) in values {
        out.push_str(&format!("{param} = {value:<24} {dir}\n"));
    }
    out.push_str(&format!("{} run(s)\n", values.len()));
    out
}

fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }
    if v != 0.0 && (v.abs() < 1e-3 || v.abs() >= 1e6) {
        format!("{v:.3e}")
    } else {
        format!("{v:.4}")
    }
}

fn fmt_pm(central: f64, dispersion: f64) -> String {
    format!("{} ± {}", fmt_num(central), fmt_num(dispersion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Estimate, MeanStd};
    use std::path::PathBuf;

    #[test]
    fn numbers_switch_to_scientific_at_extremes() {
        assert_eq!(fmt_num(12.5), "12.5000");
        assert_eq!(fmt_num(0.0), "0.0000");
        assert_eq!(fmt_num(0.0001), "1.000e-4");
        assert_eq!(fmt_num(f64::NAN), "NaN");
    }

    #[test]
    fn per_run_table_marks_missing_presented() {
        let row = PerRunStatistics {
            var: 2.0,
            varx: 8.0,
            mhc_types: MeanStd { mean: 11.0, std: 1.0 },
            slope: 0.0,
            individual: MeanStd { mean: 2.0, std: 0.5 },
            fitness: MeanStd { mean: 0.5, std: 0.1 },
            fitness_cv: MeanStd { mean: 0.1, std: 0.01 },
            presented: None,
            source_dir: PathBuf::from("/runs/r1"),
        };
        let out = format_per_run(&[row]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("n/a"));
        assert!(lines[2].ends_with("/runs/r1"));
    }

    #[test]
    fn aggregated_table_shows_plus_minus() {
        let est = Estimate { central: 11.0, dispersion: 1.0 };
        let row = AggregatedStatistics {
            var: 1.0,
            varx: 5.0,
            n_runs: 2,
            mhc_types: est,
            individual: est,
            fitness: est,
            fitness_cv: est,
            presented: Estimate { central: f64::NAN, dispersion: f64::NAN },
        };
        let out = format_aggregated(&[row], AggregationMode::Pooled);
        assert!(out.starts_with("Aggregated (pooled std):"));
        assert!(out.contains("11.0000 ± 1.0000"));
        assert!(out.contains("NaN ± NaN"));
    }
}
