//! Steady-state statistics for one run.
//!
//! The last `steady_window` generations of a run are treated as past the
//! transient. Over that window we compute:
//!
//! - mean/std and OLS slope of the population MHC type count
//! - mean/std of the per-individual MHC type counts (raw)
//! - mean/std of host fitness, divided by the pathogen load
//! - mean/std of the per-generation fitness CV, divided by the pathogen load
//! - mean/std of presented pathogens, divided by the pathogen load (optional file)
//!
//! The pathogen load is `pathogen generations per host generation × pathogen species`.
//!
//! Errors come back as `AppError`. A window at least as long as the run is
//! structural (`is_structural()`) and must abort the whole aggregation; every
//! other error concerns this run only.

use tracing::{debug, info};

use crate::domain::{
    MeanStd, PATHOGEN_GENERATIONS_FIELD, PATHOGEN_SPECIES_FIELD, PerRunStatistics, RoleMap, RunDirectory,
};
use crate::error::AppError;
use crate::io::series::{CountMatrix, DiversitySeries, load_diversity, load_matrix, load_optional_matrix};
use crate::math::{linear_slope, mean, std_dev};

/// All time series of one run, already loaded.
#[derive(Debug, Clone, Default)]
pub struct RunSeries {
    pub diversity: DiversitySeries,
    pub individual: CountMatrix,
    pub presented: Option<CountMatrix>,
}

impl RunSeries {
    pub fn load(run: &RunDirectory) -> Result<Self, AppError> {
        let diversity = load_diversity(&run.diversity_file()).map_err(AppError::input)?;
        let individual = load_matrix(&run.individual_file()).map_err(AppError::input)?;
        let presented = load_optional_matrix(&run.presented_file()).map_err(AppError::input)?;
        if presented.is_none() {
            info!(dir = %run.path.display(), "No presented-pathogen file; recording as missing");
        }
        Ok(Self {
            diversity,
            individual,
            presented,
        })
    }
}

/// The scalar part of `PerRunStatistics`, before the run's identity is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct SteadyState {
    pub mhc_types: MeanStd,
    pub slope: f64,
    pub individual: MeanStd,
    pub fitness: MeanStd,
    pub fitness_cv: MeanStd,
    pub presented: Option<MeanStd>,
}

/// Index of the first steady-window row.
///
/// The window must be strictly shorter than the run; anything else is a
/// caller error in choosing the window.
pub fn steady_window_start(total_rows: usize, steady_window: usize) -> Result<usize, AppError> {
    if total_rows <= steady_window {
        return Err(AppError::structural(format!(
            "Not enough generations: the run has {total_rows} rows but the steady window is {steady_window}."
        )));
    }
    Ok(total_rows - steady_window)
}

/// Pathogen load used to normalize fitness and presentation metrics.
pub fn pathogen_load(run: &RunDirectory) -> Result<f64, AppError> {
    let generations = run.params.number(PATHOGEN_GENERATIONS_FIELD).map_err(AppError::input)?;
    let species = run.params.number(PATHOGEN_SPECIES_FIELD).map_err(AppError::input)?;
    let load = generations * species;
    if !load.is_finite() || load <= 0.0 {
        return Err(AppError::input(format!(
            "Pathogen load must be positive (generations {generations} × species {species})."
        )));
    }
    Ok(load)
}

fn mean_std(xs: &[f64]) -> MeanStd {
    MeanStd {
        mean: mean(xs),
        std: std_dev(xs),
    }
}

fn scaled(ms: MeanStd, norm: f64) -> MeanStd {
    MeanStd {
        mean: ms.mean / norm,
        std: ms.std / norm,
    }
}

/// Reduce loaded series to steady-state scalars.
pub fn summarize(series: &RunSeries, steady_window: usize, norm: f64) -> Result<SteadyState, AppError> {
    let d = &series.diversity;
    let start = steady_window_start(d.len(), steady_window)?;

    let mhc = &d.mhc_types[start..];
    let slope = linear_slope(&d.time[start..], mhc);

    let individual = mean_std(&series.individual.values_from(start));

    let fitness = scaled(mean_std(&d.mean_fitness[start..]), norm);

    // CV is taken row-wise over the whole run, then windowed; rows with a
    // zero mean fitness produce non-finite ratios and are dropped.
    let cv: Vec<f64> = d
        .std_fitness
        .iter()
        .zip(&d.mean_fitness)
        .map(|(s, m)| s / m)
        .skip(start)
        .filter(|v| v.is_finite())
        .collect();
    let fitness_cv = scaled(mean_std(&cv), norm);

    let presented = series
        .presented
        .as_ref()
        .map(|m| scaled(mean_std(&m.values_from(start)), norm));

    Ok(SteadyState {
        mhc_types: mean_std(mhc),
        slope,
        individual,
        fitness,
        fitness_cv,
        presented,
    })
}

/// Value of a role field in a run, NaN when the template has no such role.
fn role_value(run: &RunDirectory, field: Option<&str>) -> Result<f64, AppError> {
    match field {
        Some(name) => run.params.number(name).map_err(AppError::input),
        None => Ok(f64::NAN),
    }
}

/// Load one matched run and compute its `PerRunStatistics`.
pub fn extract(run: &RunDirectory, roles: &RoleMap, steady_window: usize) -> Result<PerRunStatistics, AppError> {
    let var = role_value(run, roles.var.as_deref())?;
    let varx = role_value(run, roles.varx.as_deref())?;
    let norm = pathogen_load(run)?;

    let series = RunSeries::load(run)?;
    let steady = summarize(&series, steady_window, norm).map_err(|e| {
        AppError::new(e.exit_code(), format!("{} (run {})", e.message(), run.path.display()))
    })?;
    debug!(dir = %run.path.display(), var, varx, mhc_mean = steady.mhc_types.mean, "Extracted run");

    Ok(PerRunStatistics {
        var,
        varx,
        mhc_types: steady.mhc_types,
        slope: steady.slope,
        individual: steady.individual,
        fitness: steady.fitness,
        fitness_cv: steady.fitness_cv,
        presented: steady.presented,
        source_dir: run.path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> RunSeries {
        let mut d = DiversitySeries::default();
        for i in 0..n {
            let t = i as f64;
            d.time.push(t);
            d.pop_size.push(100.0);
            d.total_genes.push(200.0);
            d.mhc_types.push(if i < n / 2 { 50.0 } else { 10.0 + (i % 2) as f64 * 2.0 });
            d.shannon.push(1.0);
            d.mean_fitness.push(if i == n - 1 { 0.0 } else { 20.0 });
            d.std_fitness.push(if i == n - 1 { 0.0 } else { 4.0 });
        }
        let individual = CountMatrix {
            rows: (0..n).map(|i| vec![i as f64, 1.0, 3.0]).collect(),
        };
        RunSeries {
            diversity: d,
            individual,
            presented: None,
        }
    }

    #[test]
    fn window_covers_exactly_the_last_rows() {
        assert_eq!(steady_window_start(10, 4).unwrap(), 6);
        assert_eq!(steady_window_start(10, 9).unwrap(), 1);
    }

    #[test]
    fn window_as_long_as_run_is_fatal() {
        assert!(steady_window_start(10, 10).unwrap_err().is_structural());
        assert!(steady_window_start(10, 50).unwrap_err().is_structural());
    }

    #[test]
    fn transient_prefix_is_ignored() {
        let s = summarize(&series(20), 10, 2.0).unwrap();
        // Window rows alternate 10/12; the transient 50s must not leak in.
        assert!((s.mhc_types.mean - 11.0).abs() < 1e-12);
        assert!((s.mhc_types.std - 1.0).abs() < 1e-12);
        assert!((s.individual.mean - 2.0).abs() < 1e-12);
        assert!((s.individual.std - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fitness_metrics_are_normalized() {
        let s = summarize(&series(20), 10, 2.0).unwrap();
        // Nine rows at 20 and a final 0 row.
        assert!((s.fitness.mean - 18.0 / 2.0).abs() < 1e-12);
        assert!((s.fitness.std - 6.0 / 2.0).abs() < 1e-12);
        // The 0/0 CV row is dropped; the others are 0.2.
        assert!((s.fitness_cv.mean - 0.1).abs() < 1e-12);
        assert!(s.fitness_cv.std.abs() < 1e-12);
        assert!(s.presented.is_none());
    }

    #[test]
    fn presented_counts_are_normalized_when_present() {
        let mut run = series(6);
        run.presented = Some(CountMatrix {
            rows: (0..6).map(|i| vec![i as f64, 4.0, 8.0]).collect(),
        });
        let s = summarize(&run, 3, 4.0).unwrap();
        let p = s.presented.unwrap();
        assert!((p.mean - 1.5).abs() < 1e-12);
        assert!((p.std - 0.5).abs() < 1e-12);
    }
}
