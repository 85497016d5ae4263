//! Image processing utilities for astronomical denoising.
//!
//! - **noise**: noise generation for synthetic observations and noise level
//!   estimation from a single image
//! - **test_patterns**: deterministic ground-truth signals (spectra, star
//!   fields, smooth blobs) used to measure reconstruction quality

pub mod noise;
pub mod test_patterns;

pub use noise::{
    add_gaussian_noise, add_heteroscedastic_noise, apply_poisson_photon_noise,
    estimate_noise_level, estimate_noise_variance, simple_normal_array, NoiseError,
};
pub use test_patterns::{gaussian_blob, gaussian_line_spectrum, star_field, StarSpec};
