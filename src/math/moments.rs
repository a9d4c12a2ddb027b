//! Sample moments and interval estimates.
//!
//! Conventions (these are what the downstream tables assume):
//! - `std_dev` is the population standard deviation (divisor `n`)
//! - `sem` uses the sample standard deviation (divisor `n - 1`)
//! - empty input yields NaN, never zero

use statrs::distribution::{ContinuousCDF, StudentsT};

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population standard deviation.
pub fn std_dev(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64;
    var.sqrt()
}

/// `sqrt(Σ s_i² / n)`: the equal-weight pooled standard deviation of a group
/// whose members each report their own standard deviation `s_i`.
pub fn pooled_std(stds: &[f64]) -> f64 {
    if stds.is_empty() {
        return f64::NAN;
    }
    (stds.iter().map(|s| s * s).sum::<f64>() / stds.len() as f64).sqrt()
}

/// Standard error of the mean (sample standard deviation over `sqrt(n)`).
///
/// NaN for fewer than two values.
pub fn sem(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (n - 1) as f64;
    var.sqrt() / (n as f64).sqrt()
}

/// Two-sided Student-t critical value for `confidence` at `df` degrees of freedom.
///
/// NaN when `df` is zero or the distribution cannot be built.
pub fn t_critical(confidence: f64, df: usize) -> f64 {
    if df == 0 {
        return f64::NAN;
    }
    match StudentsT::new(0.0, 1.0, df as f64) {
        Ok(dist) => dist.inverse_cdf((1.0 + confidence) / 2.0),
        Err(_) => f64::NAN,
    }
}

/// Half-width of the two-sided `confidence` interval for the mean of `xs`.
///
/// Single-value samples have no spread estimate and yield NaN.
pub fn confidence_half_width(xs: &[f64], confidence: f64) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    sem(xs) * t_critical(confidence, xs.len() - 1)
}
