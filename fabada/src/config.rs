//! Engine configuration and its JSON persistence.

use crate::error::FabadaError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Iteration cap used when none is given.
pub const DEFAULT_MAX_ITERATIONS: usize = 3000;

/// Errors loading or saving a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config format error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] FabadaError),
}

/// Tunable parameters of a FABADA run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabadaConfig {
    /// Upper bound on refinement steps; must be positive.
    pub max_iterations: usize,
    /// Emit progress through `tracing` at info level.
    pub verbose: bool,
}

impl Default for FabadaConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            verbose: true,
        }
    }
}

impl FabadaConfig {
    pub fn new(max_iterations: usize, verbose: bool) -> Self {
        Self {
            max_iterations,
            verbose,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the configuration, failing with `InvalidConfiguration`.
    pub fn validate(&self) -> Result<(), FabadaError> {
        if self.max_iterations == 0 {
            return Err(FabadaError::InvalidConfiguration(
                "max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Save as pretty-printed JSON
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file. Missing fields take their defaults; the result
    /// is validated.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_command_line_defaults() {
        let config = FabadaConfig::default();
        assert_eq!(config.max_iterations, 3000);
        assert!(config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_is_invalid() {
        let config = FabadaConfig::default().with_max_iterations(0);
        assert!(matches!(
            config.validate(),
            Err(FabadaError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let config = FabadaConfig::new(250, false);

        config.save_to_file(file.path()).unwrap();
        let loaded = FabadaConfig::load_from_file(file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{ "verbose": false }"#).unwrap();

        let loaded = FabadaConfig::load_from_file(file.path()).unwrap();

        assert_eq!(loaded.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert!(!loaded.verbose);
    }

    #[test]
    fn test_invalid_file_contents() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{ "max_iterations": 0 }"#).unwrap();
        assert!(matches!(
            FabadaConfig::load_from_file(file.path()),
            Err(ConfigError::Invalid(FabadaError::InvalidConfiguration(_)))
        ));

        std::fs::write(file.path(), "not json").unwrap();
        assert!(matches!(
            FabadaConfig::load_from_file(file.path()),
            Err(ConfigError::Json(_))
        ));
    }
}
