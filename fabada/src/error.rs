//! Error type for the denoising engine.

use thiserror::Error;

/// Precondition failures reported by the engine before any computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FabadaError {
    #[error("variance shape {variance:?} does not match observation shape {observation:?}")]
    ShapeMismatch {
        observation: Vec<usize>,
        variance: Vec<usize>,
    },
    #[error("variance must be finite and positive, found {value} at flat index {index}")]
    InvalidVariance { index: usize, value: f64 },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("observation contains no samples")]
    EmptyObservation,
    #[error("observation contains a non-finite value at flat index {index}")]
    NonFiniteObservation { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = FabadaError::ShapeMismatch {
            observation: vec![4, 4],
            variance: vec![4, 5],
        };
        assert_eq!(
            error.to_string(),
            "variance shape [4, 5] does not match observation shape [4, 4]"
        );

        let error = FabadaError::InvalidVariance { index: 3, value: -1.0 };
        assert!(error.to_string().contains("found -1 at flat index 3"));

        let error = FabadaError::InvalidConfiguration("max_iterations must be positive".into());
        assert!(error.to_string().starts_with("invalid configuration"));
    }
}
