//! Model evidence and chi-square bookkeeping for the stopping rule.

use crate::error::FabadaError;
use statrs::distribution::{ChiSquared, Continuous};
use std::f64::consts::PI;

/// Natural log of the Gaussian evidence of the data given a prior.
///
/// Likelihood of observing `data` when the prior predicts `prior_mean` with
/// variance `prior_variance` and the data carries noise variance `variance`:
/// `ln N(data | prior_mean, prior_variance + variance)`.
#[inline]
pub(crate) fn log_gaussian_evidence(
    prior_mean: f64,
    data: f64,
    prior_variance: f64,
    variance: f64,
) -> f64 {
    let total = prior_variance + variance;
    let delta = prior_mean - data;
    -(delta * delta) / (2.0 * total) - 0.5 * (2.0 * PI * total).ln()
}

/// Log evidence assigned to the raw data (iteration zero).
///
/// The data one standard deviation away from a flat zero prior.
#[inline]
pub(crate) fn log_initial_evidence(variance: f64) -> f64 {
    log_gaussian_evidence(0.0, variance.sqrt(), 0.0, variance)
}

/// Tracks the chi-square probability density across iterations.
///
/// The stopping rule looks at the curvature of `pdf(chi2)`: once the data
/// chi-square passes the number of degrees of freedom and the pdf stops
/// bending downwards, further smoothing only removes signal.
#[derive(Debug, Clone)]
pub(crate) struct ChiSquareMonitor {
    distribution: ChiSquared,
    degrees_of_freedom: f64,
    pdf: f64,
    derivative: f64,
}

/// Chi-square statistics of one iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ChiSquareStep {
    pub pdf: f64,
    pub derivative: f64,
    pub second_derivative: f64,
}

impl ChiSquareMonitor {
    pub fn new(samples: usize) -> Result<Self, FabadaError> {
        let degrees_of_freedom = samples as f64;
        let distribution = ChiSquared::new(degrees_of_freedom).map_err(|e| {
            FabadaError::InvalidConfiguration(format!(
                "chi-square with {samples} degrees of freedom: {e}"
            ))
        })?;
        Ok(Self {
            distribution,
            degrees_of_freedom,
            pdf: 0.0,
            derivative: 0.0,
        })
    }

    pub fn degrees_of_freedom(&self) -> f64 {
        self.degrees_of_freedom
    }

    /// Record the chi-square of a new iteration and return its pdf and the
    /// first and second finite differences against previous iterations.
    pub fn update(&mut self, chi2: f64) -> ChiSquareStep {
        let pdf = self.distribution.pdf(chi2);
        let derivative = pdf - self.pdf;
        let second_derivative = derivative - self.derivative;

        self.pdf = pdf;
        self.derivative = derivative;

        ChiSquareStep {
            pdf,
            derivative,
            second_derivative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_evidence_peak() {
        let peak = log_gaussian_evidence(5.0, 5.0, 0.5, 0.5).exp();
        assert_relative_eq!(peak, 1.0 / (2.0 * PI).sqrt(), epsilon = 1e-12);
        assert!(log_gaussian_evidence(5.0, 7.0, 0.5, 0.5).exp() < peak);
    }

    #[test]
    fn test_initial_evidence_is_one_sigma_away() {
        let variance = 4.0;
        let expected = (-0.5f64).exp() / (2.0 * PI * variance).sqrt();
        assert_relative_eq!(log_initial_evidence(variance).exp(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_log_evidence_stays_finite_for_tiny_variance() {
        let log_evidence = log_gaussian_evidence(1.0, 2.0, 1e-300, 1e-300);
        assert!(log_evidence.is_finite());
        assert!(log_evidence < -1e299);
        assert!(log_initial_evidence(1e-300).is_finite());
    }

    #[test]
    fn test_chi_square_differences() {
        let mut monitor = ChiSquareMonitor::new(10).unwrap();
        assert_eq!(monitor.degrees_of_freedom(), 10.0);

        let first = monitor.update(2.0);
        assert_eq!(first.derivative, first.pdf);
        assert_eq!(first.second_derivative, first.pdf);

        let second = monitor.update(8.0);
        assert_relative_eq!(second.derivative, second.pdf - first.pdf);
        assert_relative_eq!(second.second_derivative, second.derivative - first.derivative);
    }

    #[test]
    fn test_chi_square_pdf_peaks_near_dof() {
        let mut monitor = ChiSquareMonitor::new(1000).unwrap();
        let near = monitor.update(998.0).pdf;
        let mut fresh = ChiSquareMonitor::new(1000).unwrap();
        let far = fresh.update(1500.0).pdf;
        assert!(near > far);
        assert!(near.is_finite() && near > 0.0);
    }

    #[test]
    fn test_zero_samples_rejected() {
        assert!(ChiSquareMonitor::new(0).is_err());
    }
}
