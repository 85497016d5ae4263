//! The FABADA iterative denoising engine.
//!
//! # Algorithm
//!
//! Starting from the data itself, every iteration
//! 1. builds a prior whose mean is the neighbourhood running mean of the
//!    current posterior and whose variance is the current posterior variance,
//! 2. combines prior and data with Bayes' theorem into a new posterior,
//! 3. scores the posterior with its Gaussian evidence and the data chi-square,
//! 4. adds the posterior to a running evidence-weighted model.
//!
//! Iteration stops when the chi-square exceeds the number of samples, its
//! probability density stops curving downwards and the mean evidence starts
//! to drop, or when the iteration cap is reached. The raw data is folded
//! into the model as iteration zero and the weighted model is returned.
//!
//! # Determinism
//!
//! Pointwise updates run on the rayon pool; reductions are evaluated
//! sequentially, so identical inputs give bit-identical estimates.

mod evidence;
pub mod running_mean;
mod state;

pub use running_mean::running_mean;

use crate::config::FabadaConfig;
use crate::error::FabadaError;
use crate::variance::Variance;
use ndarray::{ArrayD, ArrayViewD};
use state::{IterationState, IterationStats};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Iterations between progress lines in verbose mode.
const PROGRESS_INTERVAL: usize = 100;

/// Summary of one engine invocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FabadaReport {
    /// Refinement steps performed, never more than the configured cap.
    pub iterations: usize,
    /// True when the statistical stopping rule fired before the cap.
    pub converged: bool,
    /// Chi-square of the data against the last posterior.
    pub chi2: f64,
    /// `chi2` divided by the number of samples.
    pub reduced_chi2: f64,
    /// Mean evidence of the last posterior.
    pub evidence_mean: f64,
    pub elapsed: Duration,
}

/// Denoised estimate plus the run summary
#[derive(Debug, Clone)]
pub struct FabadaResult {
    pub estimate: ArrayD<f64>,
    pub report: FabadaReport,
}

impl FabadaResult {
    /// Observation minus estimate.
    ///
    /// # Panics
    /// If `observation` does not have the estimate's shape.
    pub fn residuals(&self, observation: &ArrayViewD<'_, f64>) -> ArrayD<f64> {
        observation - &self.estimate
    }

    pub fn into_estimate(self) -> ArrayD<f64> {
        self.estimate
    }
}

/// Configured FABADA engine.
///
/// Holds no state between runs; `run` is a pure function of its arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fabada {
    config: FabadaConfig,
}

impl Fabada {
    pub fn new(config: FabadaConfig) -> Self {
        Self { config }
    }

    /// Denoise `observation` given its noise `variance`.
    ///
    /// All preconditions are checked before any computation: the
    /// configuration, a non-empty observation, the variance shape and values,
    /// then finite observation values.
    pub fn run(
        &self,
        observation: ArrayViewD<'_, f64>,
        variance: &Variance,
    ) -> Result<FabadaResult, FabadaError> {
        self.config.validate()?;
        validate_inputs(&observation, variance)?;

        let start = Instant::now();
        let verbose = self.config.verbose;
        let max_iterations = self.config.max_iterations;

        if verbose {
            info!(
                "Starting FABADA on {:?} samples ({} variance), at most {} iterations",
                observation.shape(),
                if variance.is_scalar() { "scalar" } else { "per-sample" },
                max_iterations
            );
        }

        let noise = variance.broadcast(observation.shape());
        let mut state = IterationState::new(observation.view(), noise)?;
        let samples = state.degrees_of_freedom();

        let mut iteration = 0;
        let (stats, converged) = loop {
            iteration += 1;
            let stats = state.step();

            trace!(
                iteration,
                chi2 = stats.chi2,
                chi2_pdf = stats.chi2_step.pdf,
                evidence = stats.evidence_mean,
                "fabada iteration"
            );
            if verbose && iteration % PROGRESS_INTERVAL == 0 {
                info!(
                    "Iteration {}: chi2/N = {:.4}, mean evidence = {:.4e}",
                    iteration,
                    stats.chi2 / samples,
                    stats.evidence_mean
                );
            }

            if has_converged(&stats, samples) {
                break (stats, true);
            }
            if iteration >= max_iterations {
                break (stats, false);
            }
        };

        let estimate = state.finish();
        let elapsed = start.elapsed();

        let report = FabadaReport {
            iterations: iteration,
            converged,
            chi2: stats.chi2,
            reduced_chi2: stats.chi2 / samples,
            evidence_mean: stats.evidence_mean,
            elapsed,
        };

        if verbose {
            info!(
                "FABADA {} after {} iterations in {:.3}s (chi2/N = {:.4})",
                if converged { "converged" } else { "stopped at the iteration cap" },
                report.iterations,
                elapsed.as_secs_f64(),
                report.reduced_chi2
            );
        } else {
            debug!(
                iterations = report.iterations,
                converged,
                reduced_chi2 = report.reduced_chi2,
                "fabada finished"
            );
        }

        Ok(FabadaResult { estimate, report })
    }
}

/// Denoise an observation with the given variance.
///
/// # Arguments
/// * `observation` - Non-empty array of finite samples, any dimensionality
/// * `variance` - Positive scalar or per-sample variance map
/// * `max_iterations` - Positive cap on refinement steps
/// * `verbose` - Log progress at info level; does not affect the result
///
/// # Returns
/// The denoised estimate, with the observation's shape.
pub fn denoise(
    observation: ArrayViewD<'_, f64>,
    variance: &Variance,
    max_iterations: usize,
    verbose: bool,
) -> Result<ArrayD<f64>, FabadaError> {
    Fabada::new(FabadaConfig::new(max_iterations, verbose))
        .run(observation, variance)
        .map(FabadaResult::into_estimate)
}

fn validate_inputs(
    observation: &ArrayViewD<'_, f64>,
    variance: &Variance,
) -> Result<(), FabadaError> {
    if observation.is_empty() {
        return Err(FabadaError::EmptyObservation);
    }
    variance.validate(observation.shape())?;
    if let Some(index) = observation.iter().position(|v| !v.is_finite()) {
        return Err(FabadaError::NonFiniteObservation { index });
    }
    Ok(())
}

/// The statistical stopping rule.
///
/// The fit is as good as the noise allows once chi-square passes the number
/// of samples; past that point a non-negative curvature of its pdf together
/// with falling evidence means the prior has started erasing signal.
fn has_converged(stats: &IterationStats, samples: f64) -> bool {
    stats.chi2 > samples
        && stats.chi2_step.second_derivative >= 0.0
        && stats.previous_evidence_mean > stats.evidence_mean
}
