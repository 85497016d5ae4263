//! FABADA: Fully Adaptive Bayesian Algorithm for Data Analysis.
//!
//! Iterative Bayesian denoising of spectra, images and data cubes with a
//! known noise variance (Sanchez-Alarcon & Ascasibar, 2022). Each iteration
//! builds a prior from the local neighbourhood of the current estimate,
//! combines it with the data through Bayes' theorem, and weights the
//! resulting posterior by its evidence and chi-square. The final estimate is
//! the evidence-weighted average of every posterior visited.
//!
//! The engine is a pure function of its inputs:
//!
//! ```no_run
//! use fabada::{denoise, Variance};
//! use ndarray::Array1;
//!
//! let observation = Array1::from(vec![10.2, 9.7, 10.4, 9.9, 10.1]).into_dyn();
//! let estimate = denoise(observation.view(), &Variance::Scalar(0.25), 3000, false).unwrap();
//! assert_eq!(estimate.shape(), observation.shape());
//! ```
//!
//! The `fabada` binary wraps the engine for FITS images.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod variance;

pub use config::{ConfigError, FabadaConfig, DEFAULT_MAX_ITERATIONS};
pub use engine::{denoise, running_mean, Fabada, FabadaReport, FabadaResult};
pub use error::FabadaError;
pub use variance::Variance;
