//! Command-line surface of the `fabada` binary.
//!
//! Argument definitions, classification of the `noise` argument, variance
//! resolution and output naming live here so they can be tested without
//! touching the process environment.

use crate::config::{ConfigError, FabadaConfig};
use crate::io::fits::{read_image, FitsError, HduSelector};
use crate::variance::Variance;
use clap::Parser;
use ndarray::{ArrayD, Ix2};
use shared::image_proc::noise::{estimate_noise_variance, NoiseError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Side of the square patch used for blind noise estimation.
pub const NOISE_PATCH_SIZE: usize = 8;

/// Command-line arguments
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fabada",
    author,
    version,
    about = "Runs FABADA to denoise the given FITS image"
)]
pub struct CliArgs {
    /// Location of the input .fits file
    pub filename: PathBuf,

    /// Variance of the image noise: a number, a FITS file holding a variance
    /// map, or "auto" to estimate it from the image
    pub noise: NoiseSource,

    /// Location to save the filtered image [default: <name>_fabada.<ext>]
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// HDU of the image, as index or EXTNAME
    #[arg(long, default_value = "0")]
    pub hdu: HduSelector,

    /// HDU of the noise image, as index or EXTNAME
    #[arg(long = "noise-hdu", default_value = "0")]
    pub noise_hdu: HduSelector,

    /// Save residuals to <name>_residuals.<ext>
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub res: bool,

    /// Maximum number of FABADA iterations [default: 3000]
    #[arg(long)]
    pub iter: Option<usize>,

    /// Report progress while running [default: true]
    #[arg(long, action = clap::ArgAction::Set)]
    pub verbose: Option<bool>,

    /// JSON file with engine settings; --iter and --verbose override it
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Engine configuration: file (or defaults) with flags applied on top.
    pub fn engine_config(&self) -> Result<FabadaConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => FabadaConfig::load_from_file(path)?,
            None => FabadaConfig::default(),
        };
        if let Some(iter) = self.iter {
            config.max_iterations = iter;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Where the noise variance comes from
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseSource {
    /// One variance for every sample
    Scalar(f64),
    /// Variance map stored in a FITS file; the HDU is chosen separately
    Fits(PathBuf),
    /// Estimate the variance from the image itself
    Estimate,
}

impl FromStr for NoiseSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("noise cannot be empty".to_string());
        }
        if s.eq_ignore_ascii_case("auto") {
            return Ok(NoiseSource::Estimate);
        }
        Ok(match s.parse::<f64>() {
            Ok(value) => NoiseSource::Scalar(value),
            Err(_) => NoiseSource::Fits(PathBuf::from(s)),
        })
    }
}

impl fmt::Display for NoiseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseSource::Scalar(value) => write!(f, "variance {value}"),
            NoiseSource::Fits(path) => write!(f, "variance map {}", path.display()),
            NoiseSource::Estimate => write!(f, "estimated variance"),
        }
    }
}

/// Errors resolving a [`NoiseSource`] into a [`Variance`]
#[derive(Error, Debug)]
pub enum NoiseSourceError {
    #[error("failed to read variance map: {0}")]
    Fits(#[from] FitsError),
    #[error("failed to estimate noise: {0}")]
    Estimation(#[from] NoiseError),
    #[error("noise estimation needs a 2-D image, got {0} dimensions")]
    NotAnImage(usize),
}

/// Turn a noise source into the variance handed to the engine.
///
/// Values are not validated here; the engine rejects bad shapes and
/// non-positive entries before running.
pub fn resolve_variance(
    source: &NoiseSource,
    noise_hdu: &HduSelector,
    observation: &ArrayD<f64>,
) -> Result<Variance, NoiseSourceError> {
    match source {
        NoiseSource::Scalar(value) => Ok(Variance::Scalar(*value)),
        NoiseSource::Fits(path) => {
            let map = read_image(path, noise_hdu)?;
            Ok(Variance::PerSample(map.data))
        }
        NoiseSource::Estimate => {
            let image = observation
                .view()
                .into_dimensionality::<Ix2>()
                .map_err(|_| NoiseSourceError::NotAnImage(observation.ndim()))?;
            let variance = estimate_noise_variance(&image, NOISE_PATCH_SIZE)?;
            Ok(Variance::Scalar(variance))
        }
    }
}

/// Output locations for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub estimate: PathBuf,
    pub residuals: PathBuf,
}

/// Derive output file names from the input name.
///
/// The defaults are `<name>_fabada.<ext>` and `<name>_residuals.<ext>` in the
/// working directory, where `<name>` is the input file stem. An explicit
/// `out` replaces the estimate path only.
pub fn output_paths(input: &Path, out: Option<&Path>) -> OutputPaths {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fits".to_string());

    OutputPaths {
        estimate: out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(format!("{stem}_fabada.{extension}"))),
        residuals: PathBuf::from(format!("{stem}_residuals.{extension}")),
    }
}
