//! Noise generation for synthetic astronomical observations.
//!
//! Denoising is only measurable against a known ground truth, so tests and
//! benchmarks build observations as `signal + noise` with the generators in
//! this module:
//! - Gaussian noise with a uniform standard deviation
//! - Heteroscedastic Gaussian noise with a per-sample variance map
//! - Poisson photon noise, where each sample is the mean of its own
//!   distribution
//!
//! All generators take an explicit seed and run on the rayon pool through
//! [`process_array_in_parallel_chunks`], so a given seed always reproduces
//! the same field.

use super::NoiseError;
use crate::algo::process_array_in_parallel_chunks;
use ndarray::{Array, Array2, ArrayBase, Data, Dimension, RemoveAxis, Zip};
use rand::rngs::StdRng;
use rand::{thread_rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson, StandardNormal};

/// Rows (or planes) processed per parallel work item.
const CHUNK_ROWS: usize = 64;

/// Generate a 2D array of normally distributed values.
///
/// Deterministic for a given seed; useful for unit tests that need a
/// reproducible noise pattern.
///
/// # Arguments
/// * `size` - (height, width) of the output array
/// * `mean` - Mean of the normal distribution
/// * `std_dev` - Standard deviation, must be finite and non-negative
/// * `seed` - Random seed
pub fn simple_normal_array(
    size: (usize, usize),
    mean: f64,
    std_dev: f64,
    seed: u64,
) -> Result<Array2<f64>, NoiseError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal_dist = Normal::new(mean, std_dev).map_err(|e| {
        NoiseError::InvalidParameter(format!("normal(mean={mean}, std_dev={std_dev}): {e}"))
    })?;
    Ok(Array2::from_shape_fn(size, |_| normal_dist.sample(&mut rng)))
}

/// Generate a field of independent N(0, 1) samples with the given shape.
pub fn standard_normal_field<D>(shape: D, seed: u64) -> Array<f64, D>
where
    D: Dimension + RemoveAxis,
{
    process_array_in_parallel_chunks(
        Array::zeros(shape),
        seed,
        Some(CHUNK_ROWS),
        |chunk, rng| {
            chunk
                .iter_mut()
                .for_each(|v| *v = StandardNormal.sample(rng));
        },
    )
}

/// Add zero-mean Gaussian noise with a uniform standard deviation.
pub fn add_gaussian_noise<S, D>(
    signal: &ArrayBase<S, D>,
    sigma: f64,
    seed: u64,
) -> Result<Array<f64, D>, NoiseError>
where
    S: Data<Elem = f64>,
    D: Dimension + RemoveAxis,
{
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(NoiseError::InvalidParameter(format!(
            "sigma must be finite and non-negative, got {sigma}"
        )));
    }

    let noise = standard_normal_field(signal.raw_dim(), seed);
    Ok(signal.to_owned() + noise * sigma)
}

/// Add zero-mean Gaussian noise whose variance varies per sample.
///
/// # Arguments
/// * `signal` - Noise-free signal
/// * `variance` - Per-sample variance, same shape as `signal`, non-negative
/// * `seed` - Random seed
pub fn add_heteroscedastic_noise<S1, S2, D>(
    signal: &ArrayBase<S1, D>,
    variance: &ArrayBase<S2, D>,
    seed: u64,
) -> Result<Array<f64, D>, NoiseError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension + RemoveAxis,
{
    if signal.shape() != variance.shape() {
        return Err(NoiseError::ShapeMismatch {
            signal: signal.shape().to_vec(),
            variance: variance.shape().to_vec(),
        });
    }
    if let Some(bad) = variance.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(NoiseError::InvalidParameter(format!(
            "variance entries must be finite and non-negative, got {bad}"
        )));
    }

    let mut noisy = standard_normal_field(signal.raw_dim(), seed);
    Zip::from(&mut noisy)
        .and(signal)
        .and(variance)
        .for_each(|n, &s, &v| *n = s + *n * v.sqrt());
    Ok(noisy)
}

/// Apply Poisson arrival statistics to a mean photon image in parallel.
///
/// Each sample is treated as the mean of its own Poisson distribution.
/// Means above 20 use the normal approximation, clipped at zero; non-positive
/// means produce zero.
///
/// # Arguments
/// * `mean_image` - Mean counts per sample
/// * `rng_seed` - Optional seed; a random one is drawn when absent
pub fn apply_poisson_photon_noise<S, D>(
    mean_image: &ArrayBase<S, D>,
    rng_seed: Option<u64>,
) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension + RemoveAxis,
{
    let seed = rng_seed.unwrap_or_else(|| thread_rng().next_u64());

    process_array_in_parallel_chunks(
        mean_image.to_owned(),
        seed,
        Some(CHUNK_ROWS),
        |chunk, rng| {
            chunk.iter_mut().for_each(|pixel| {
                let mean = *pixel;
                *pixel = if mean <= 0.0 || !mean.is_finite() {
                    0.0
                } else if mean < 20.0 {
                    match Poisson::new(mean) {
                        Ok(poisson) => poisson.sample(rng),
                        Err(_) => 0.0,
                    }
                } else {
                    let gaussian: f64 = StandardNormal.sample(rng);
                    (mean + gaussian * mean.sqrt()).max(0.0)
                };
            });
        },
    )
}
