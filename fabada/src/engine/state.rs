//! Per-invocation iteration state of the engine.

use super::evidence::{
    log_gaussian_evidence, log_initial_evidence, ChiSquareMonitor, ChiSquareStep,
};
use super::running_mean::{neighbourhood_counts, neighbourhood_sum};
use crate::error::FabadaError;
use ndarray::{ArrayD, ArrayViewD, Zip};

/// Statistics of a completed iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IterationStats {
    pub chi2: f64,
    pub chi2_step: ChiSquareStep,
    pub evidence_mean: f64,
    pub previous_evidence_mean: f64,
}

/// Everything the engine mutates while iterating.
///
/// Owned by a single invocation and dropped when it returns. The weighted
/// model is kept per sample as `model / weight` relative to `exp(log_scale)`,
/// the largest log weight seen so far, so weights never overflow.
pub(crate) struct IterationState<'a> {
    data: ArrayViewD<'a, f64>,
    variance: ArrayD<f64>,
    counts: ArrayD<f64>,
    posterior_mean: ArrayD<f64>,
    posterior_variance: ArrayD<f64>,
    log_evidence: ArrayD<f64>,
    log_initial_evidence: ArrayD<f64>,
    model: ArrayD<f64>,
    weight: ArrayD<f64>,
    log_scale: ArrayD<f64>,
    chi2_monitor: ChiSquareMonitor,
    evidence_mean: f64,
    chi2_first: Option<f64>,
}

impl<'a> IterationState<'a> {
    /// Iteration zero: the posterior is the data itself.
    pub fn new(data: ArrayViewD<'a, f64>, variance: ArrayD<f64>) -> Result<Self, FabadaError> {
        let chi2_monitor = ChiSquareMonitor::new(data.len())?;
        let log_evidence_zero = variance.mapv(log_initial_evidence);
        let evidence_mean = mean_evidence(&log_evidence_zero);

        Ok(Self {
            counts: neighbourhood_counts(data.raw_dim()),
            posterior_mean: data.to_owned(),
            posterior_variance: variance.clone(),
            log_evidence: log_evidence_zero.clone(),
            model: ArrayD::zeros(data.raw_dim()),
            weight: ArrayD::zeros(data.raw_dim()),
            log_scale: ArrayD::from_elem(data.raw_dim(), f64::NEG_INFINITY),
            data,
            variance,
            log_initial_evidence: log_evidence_zero,
            chi2_monitor,
            evidence_mean,
            chi2_first: None,
        })
    }

    pub fn degrees_of_freedom(&self) -> f64 {
        self.chi2_monitor.degrees_of_freedom()
    }

    /// Run one prior / Bayes / evidence / weighting cycle.
    pub fn step(&mut self) -> IterationStats {
        let prior_mean = neighbourhood_sum(&self.posterior_mean) / &self.counts;

        // The previous posterior variance is the prior variance of this step.
        Zip::from(&mut self.posterior_mean)
            .and(&mut self.posterior_variance)
            .and(&mut self.log_evidence)
            .and(&prior_mean)
            .and(&self.data)
            .and(&self.variance)
            .par_for_each(|mean, var, log_evidence, &prior, &data, &noise| {
                let prior_var = *var;
                let posterior_var = 1.0 / (1.0 / prior_var + 1.0 / noise);
                *mean = (prior / prior_var + data / noise) * posterior_var;
                *var = posterior_var;
                *log_evidence = log_gaussian_evidence(prior, data, prior_var, noise);
            });

        let chi2 = Zip::from(&self.data)
            .and(&self.posterior_mean)
            .and(&self.variance)
            .fold(0.0, |acc, &data, &mean, &noise| {
                acc + (data - mean) * (data - mean) / noise
            });
        let chi2_step = self.chi2_monitor.update(chi2);
        let log_chi2 = chi2.ln();

        Zip::from(&mut self.model)
            .and(&mut self.weight)
            .and(&mut self.log_scale)
            .and(&self.log_evidence)
            .and(&self.posterior_mean)
            .par_for_each(|model, weight, log_scale, &log_evidence, &mean| {
                accumulate(model, weight, log_scale, log_evidence + log_chi2, mean);
            });

        self.chi2_first.get_or_insert(chi2);

        let previous_evidence_mean = self.evidence_mean;
        self.evidence_mean = mean_evidence(&self.log_evidence);

        IterationStats {
            chi2,
            chi2_step,
            evidence_mean: self.evidence_mean,
            previous_evidence_mean,
        }
    }

    /// Fold iteration zero into the model and return the weighted estimate.
    ///
    /// Samples that never received a positive weight (every chi-square zero,
    /// as for noiseless flat data) fall back to the last posterior mean.
    pub fn finish(mut self) -> ArrayD<f64> {
        let log_chi2_first = self.chi2_first.unwrap_or(0.0).ln();

        Zip::from(&mut self.model)
            .and(&mut self.weight)
            .and(&mut self.log_scale)
            .and(&self.log_initial_evidence)
            .and(&self.data)
            .par_for_each(|model, weight, log_scale, &log_evidence, &data| {
                accumulate(model, weight, log_scale, log_evidence + log_chi2_first, data);
            });

        Zip::from(&mut self.model)
            .and(&self.weight)
            .and(&self.posterior_mean)
            .par_for_each(|model, &weight, &fallback| {
                let estimate = *model / weight;
                *model = if weight > 0.0 && estimate.is_finite() {
                    estimate
                } else {
                    fallback
                };
            });

        self.model
    }
}

/// Add `value` with weight `exp(log_weight)` to a running weighted sum held
/// relative to `exp(log_scale)`.
#[inline]
fn accumulate(
    model: &mut f64,
    weight: &mut f64,
    log_scale: &mut f64,
    log_weight: f64,
    value: f64,
) {
    if log_weight.is_nan() || log_weight == f64::NEG_INFINITY {
        return;
    }
    if log_weight > *log_scale {
        let shrink = (*log_scale - log_weight).exp();
        *model = *model * shrink + value;
        *weight = *weight * shrink + 1.0;
        *log_scale = log_weight;
    } else {
        let w = (log_weight - *log_scale).exp();
        *model += w * value;
        *weight += w;
    }
}

/// Mean evidence with a fixed summation order.
fn mean_evidence(log_evidence: &ArrayD<f64>) -> f64 {
    log_evidence.iter().map(|v| v.exp()).sum::<f64>() / log_evidence.len() as f64
}
