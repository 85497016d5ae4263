//! Noise level estimation from a single noisy image.
//!
//! FABADA needs the variance of the noise it removes. When no variance map
//! or calibrated value is available, it can be estimated blindly from the
//! image with the patch eigenvalue method of Chen, Zhu & Heng,
//! "An Efficient Statistical Method for Image Noise Level Estimation",
//! ICCV 2015.

use super::NoiseError;
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array2, ArrayView2, Axis};

/// Stride between analysed patches, as in the paper.
const PATCH_STRIDE: usize = 3;

/// Transform an image into a matrix of flattened patches.
///
/// Each column of the output is one `patch_size x patch_size` patch taken on
/// a grid with step `stride`.
fn im2patch(image: &ArrayView2<f64>, patch_size: usize, stride: usize) -> Array2<f64> {
    let (height, width) = image.dim();

    let num_h = (height - patch_size) / stride + 1;
    let num_w = (width - patch_size) / stride + 1;
    let patch_elements = patch_size * patch_size;

    let mut patches = Array2::<f64>::zeros((patch_elements, num_h * num_w));

    let mut patch_idx = 0;
    for i in (0..=height - patch_size).step_by(stride) {
        for j in (0..=width - patch_size).step_by(stride) {
            let patch = image.slice(ndarray::s![i..i + patch_size, j..j + patch_size]);
            for (flat_idx, &value) in patch.iter().enumerate() {
                patches[[flat_idx, patch_idx]] = value;
            }
            patch_idx += 1;
        }
    }

    patches
}

/// Estimate the noise standard deviation of an image.
///
/// # Algorithm
/// 1. Extract overlapping patches with stride 3
/// 2. Compute the patch covariance matrix
/// 3. Sort its eigenvalues
/// 4. Find the largest tail whose mean equals its median; the square root of
///    that mean is the noise level
///
/// # Arguments
/// * `image` - 2D array of pixel values (any scale)
/// * `patch_size` - Side of the square analysis patch (8 is typical)
///
/// # Returns
/// Estimated noise standard deviation, in the units of the input.
pub fn estimate_noise_level(image: &ArrayView2<f64>, patch_size: usize) -> Result<f64, NoiseError> {
    let (height, width) = image.dim();
    if patch_size < 2 {
        return Err(NoiseError::InvalidParameter(format!(
            "patch size must be at least 2, got {patch_size}"
        )));
    }
    if height < patch_size || width < patch_size {
        return Err(NoiseError::ImageTooSmall {
            height,
            width,
            patch_size,
        });
    }

    let patches = im2patch(image, patch_size, PATCH_STRIDE);
    let (d, num_patches) = patches.dim();

    let mu = patches
        .mean_axis(Axis(1))
        .ok_or_else(|| NoiseError::InvalidParameter("no patches extracted".to_string()))?;
    let centered = &patches - &mu.insert_axis(Axis(1));

    let sigma_x = centered.dot(&centered.t()) / num_patches as f64;
    let covariance = DMatrix::from_fn(d, d, |i, j| sigma_x[[i, j]]);

    let eigen = SymmetricEigen::new(covariance);
    let mut eigenvalues: Vec<f64> = eigen.eigenvalues.iter().map(|v| v.max(0.0)).collect();
    eigenvalues.sort_by(|a, b| a.total_cmp(b));

    for i in (1..d).rev() {
        let tail = &eigenvalues[0..i];
        let tau = tail.iter().sum::<f64>() / i as f64;

        let num_greater = tail.iter().filter(|&&v| v > tau).count();
        let num_less = tail.iter().filter(|&&v| v < tau).count();

        if num_greater == num_less {
            return Ok(tau.sqrt());
        }
    }

    let mid = (d / 2).max(1);
    Ok((eigenvalues[0..mid].iter().sum::<f64>() / mid as f64).sqrt())
}

/// Estimate the noise variance of an image, the square of
/// [`estimate_noise_level`].
pub fn estimate_noise_variance(
    image: &ArrayView2<f64>,
    patch_size: usize,
) -> Result<f64, NoiseError> {
    estimate_noise_level(image, patch_size).map(|sigma| sigma * sigma)
}
