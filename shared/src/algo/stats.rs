//! Statistical functions for evaluating denoised data
//!
//! The normal CDF, the Kolmogorov-Smirnov normality statistic used to check
//! that residuals look like the injected noise, and the reconstruction
//! quality metrics (MSE, PSNR) used to compare an estimate against a known
//! ground truth.

use ndarray::{ArrayBase, Data, Dimension, Zip};
use scilib::math::basic::erf;
use std::f64::consts::SQRT_2;
use thiserror::Error;

/// Errors from statistics that need well-formed input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("statistic requires at least one value")]
    EmptyInput,
    #[error("shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },
}

/// Cumulative distribution function for standard normal distribution
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / SQRT_2))
}

/// Kolmogorov-Smirnov test statistic against a normal distribution
///
/// The sample is standardised with its own mean and standard deviation
/// before comparison, so this answers "is the shape Gaussian" rather than
/// "is it N(0, 1)".
///
/// # Returns
/// Maximum distance between empirical and theoretical CDFs. Returns 1.0 for
/// empty or constant samples.
pub fn ks_test_normal(residuals: &[f64]) -> f64 {
    let n = residuals.len();
    if n == 0 {
        return 1.0;
    }

    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean: f64 = sorted.iter().sum::<f64>() / n as f64;
    let variance: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();

    if std_dev < 1e-10 {
        return 1.0;
    }

    let mut max_diff: f64 = 0.0;
    for (i, value) in sorted.iter().enumerate() {
        let theoretical_cdf = normal_cdf((value - mean) / std_dev);

        let empirical_cdf_before = i as f64 / n as f64;
        let empirical_cdf_after = (i + 1) as f64 / n as f64;

        let diff1 = (empirical_cdf_before - theoretical_cdf).abs();
        let diff2 = (empirical_cdf_after - theoretical_cdf).abs();

        max_diff = max_diff.max(diff1).max(diff2);
    }

    max_diff
}

/// Critical value for the KS statistic at a given significance level
///
/// Asymptotic approximation, valid for large `n`.
pub fn ks_critical_value(n: usize, alpha: f64) -> f64 {
    let c_alpha = match alpha {
        a if (a - 0.10).abs() < 1e-6 => 1.22,
        a if (a - 0.05).abs() < 1e-6 => 1.36,
        a if (a - 0.01).abs() < 1e-6 => 1.63,
        _ => 1.36,
    };

    c_alpha / (n as f64).sqrt()
}

/// Mean squared error between an estimate and a reference array
pub fn mean_squared_error<S1, S2, D>(
    estimate: &ArrayBase<S1, D>,
    reference: &ArrayBase<S2, D>,
) -> Result<f64, StatsError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    if estimate.shape() != reference.shape() {
        return Err(StatsError::ShapeMismatch {
            left: estimate.shape().to_vec(),
            right: reference.shape().to_vec(),
        });
    }
    if estimate.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    let sum = Zip::from(estimate)
        .and(reference)
        .fold(0.0, |acc, &e, &r| acc + (e - r).powi(2));

    Ok(sum / estimate.len() as f64)
}

/// Peak signal-to-noise ratio in decibels
///
/// `PSNR = 10 log10(peak^2 / MSE)`. A perfect reconstruction yields
/// `f64::INFINITY`.
///
/// # Arguments
/// * `estimate` - Reconstructed signal
/// * `reference` - Ground truth
/// * `peak` - Dynamic range of the reference (e.g. its maximum value)
pub fn psnr<S1, S2, D>(
    estimate: &ArrayBase<S1, D>,
    reference: &ArrayBase<S2, D>,
    peak: f64,
) -> Result<f64, StatsError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    let mse = mean_squared_error(estimate, reference)?;
    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (peak * peak / mse).log10())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_erf_basic_values() {
        assert!((erf(0.0) - 0.0).abs() < 1e-6);
        assert!((erf(1.0) - 0.8427007929).abs() < 1e-6);
        assert!((erf(-1.0) - (-0.8427007929)).abs() < 1e-6);
        assert!(erf(5.0) > 0.9999);
    }

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!((normal_cdf(1.0) - 0.8413447461).abs() < 1e-6);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 0.001);
    }

    #[test]
    fn test_ks_small_for_normal_quantiles() {
        let n = 1000;
        let samples: Vec<f64> = (1..=n)
            .map(|i| {
                let p = (i as f64 - 0.5) / n as f64;
                if p < 0.5 {
                    -(-2.0 * (2.0 * p).ln()).sqrt()
                } else {
                    (-2.0 * (2.0 * (1.0 - p)).ln()).sqrt()
                }
            })
            .collect();

        let ks_stat = ks_test_normal(&samples);
        let critical = ks_critical_value(n, 0.05);
        assert!(
            ks_stat < critical * 2.0,
            "KS statistic {ks_stat} should be small for normal data (critical: {critical})"
        );
    }

    #[test]
    fn test_ks_large_for_uniform_steps() {
        let samples: Vec<f64> = (0..1000).map(|i| if i % 2 == 0 { 0.0 } else { 1.0 }).collect();
        assert!(ks_test_normal(&samples) > ks_critical_value(1000, 0.01));
    }

    #[test]
    fn test_mse_and_psnr() {
        let truth = array![1.0, 2.0, 3.0, 4.0];
        let estimate = array![1.0, 2.0, 3.0, 6.0];

        assert_relative_eq!(mean_squared_error(&estimate, &truth).unwrap(), 1.0);
        assert_relative_eq!(psnr(&estimate, &truth, 10.0).unwrap(), 20.0, epsilon = 1e-12);
        assert_eq!(psnr(&truth, &truth, 4.0).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_mse_rejects_shape_mismatch() {
        let a = Array2::<f64>::zeros((2, 3));
        let b = Array2::<f64>::zeros((3, 2));
        assert!(matches!(
            mean_squared_error(&a, &b),
            Err(StatsError::ShapeMismatch { .. })
        ));
    }
}
