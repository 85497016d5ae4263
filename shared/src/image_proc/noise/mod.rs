//! Noise processing for astronomical image denoising
//!
//! - **generate**: seeded noise generation for synthetic observations
//! - **quantify**: noise level estimation from a single noisy image

pub mod generate;
pub mod quantify;

use thiserror::Error;

pub use generate::{
    add_gaussian_noise, add_heteroscedastic_noise, apply_poisson_photon_noise,
    simple_normal_array, standard_normal_field,
};
pub use quantify::{estimate_noise_level, estimate_noise_variance};

/// Errors raised by noise generation and estimation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseError {
    #[error("invalid noise parameter: {0}")]
    InvalidParameter(String),
    #[error("shape mismatch: signal {signal:?} vs variance {variance:?}")]
    ShapeMismatch {
        signal: Vec<usize>,
        variance: Vec<usize>,
    },
    #[error("image {height}x{width} is smaller than the {patch_size}x{patch_size} analysis patch")]
    ImageTooSmall {
        height: usize,
        width: usize,
        patch_size: usize,
    },
}
