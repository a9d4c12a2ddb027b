//! Group per-run statistics by `(VAR, VARX)` and reduce each group.
//!
//! Both modes use the arithmetic mean of the per-run values as the central
//! estimate. They differ in dispersion:
//!
//! - `Pooled`: `sqrt(Σ std_i² / n)` over the per-run standard deviations
//! - `Ci`: half-width of the two-sided 95% Student-t interval of the per-run
//!   means (`n - 1` degrees of freedom); single-run groups give NaN
//!
//! The presented-pathogen column only uses runs where the file existed; a
//! group with no such run reports NaN for both values.

use crate::domain::{AggregatedStatistics, AggregationMode, Estimate, MeanStd, PerRunStatistics};
use crate::math::{confidence_half_width, mean, pooled_std};

pub const CONFIDENCE: f64 = 0.95;

/// Key equality for grouping; NaN (an absent VARX) groups with NaN.
fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Distinct `(VAR, VARX)` pairs in order of first appearance.
pub fn distinct_keys(rows: &[PerRunStatistics]) -> Vec<(f64, f64)> {
    let mut keys: Vec<(f64, f64)> = Vec::new();
    for row in rows {
        let seen = keys
            .iter()
            .any(|&(var, varx)| same_value(var, row.var) && same_value(varx, row.varx));
        if !seen {
            keys.push((row.var, row.varx));
        }
    }
    keys
}

/// Members of the group for one key.
pub fn group<'a>(rows: &'a [PerRunStatistics], key: (f64, f64)) -> Vec<&'a PerRunStatistics> {
    rows.iter()
        .filter(|r| same_value(r.var, key.0) && same_value(r.varx, key.1))
        .collect()
}

fn reduce(values: &[MeanStd], mode: AggregationMode) -> Estimate {
    let means: Vec<f64> = values.iter().map(|v| v.mean).collect();
    let dispersion = match mode {
        AggregationMode::Pooled => {
            let stds: Vec<f64> = values.iter().map(|v| v.std).collect();
            pooled_std(&stds)
        }
        AggregationMode::Ci => confidence_half_width(&means, CONFIDENCE),
    };
    Estimate {
        central: mean(&means),
        dispersion,
    }
}

fn column(members: &[&PerRunStatistics], pick: impl Fn(&PerRunStatistics) -> MeanStd) -> Vec<MeanStd> {
    members.iter().map(|r| pick(*r)).collect()
}

/// Reduce one group of runs to an aggregated row.
pub fn aggregate_group(key: (f64, f64), members: &[&PerRunStatistics], mode: AggregationMode) -> AggregatedStatistics {
    let presented: Vec<MeanStd> = members.iter().filter_map(|r| r.presented).collect();

    AggregatedStatistics {
        var: key.0,
        varx: key.1,
        n_runs: members.len(),
        mhc_types: reduce(&column(members, |r| r.mhc_types), mode),
        individual: reduce(&column(members, |r| r.individual), mode),
        fitness: reduce(&column(members, |r| r.fitness), mode),
        fitness_cv: reduce(&column(members, |r| r.fitness_cv), mode),
        presented: reduce(&presented, mode),
    }
}

/// One aggregated row per distinct `(VAR, VARX)` pair, in first-seen order.
pub fn aggregate(rows: &[PerRunStatistics], mode: AggregationMode) -> Vec<AggregatedStatistics> {
    distinct_keys(rows)
        .into_iter()
        .map(|key| aggregate_group(key, &group(rows, key), mode))
        .collect()
}
