//! Noise variance supplied to the engine.

use crate::error::FabadaError;
use ndarray::{Array2, ArrayD, IxDyn};

/// Noise variance of an observation.
///
/// Either one value applied to every sample or a map with the observation's
/// shape. All entries must be finite and strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub enum Variance {
    Scalar(f64),
    PerSample(ArrayD<f64>),
}

impl Variance {
    /// Scalar variance from a noise standard deviation.
    pub fn from_sigma(sigma: f64) -> Self {
        Variance::Scalar(sigma * sigma)
    }

    /// Check the variance against an observation shape.
    ///
    /// Fails with `ShapeMismatch` for a map of the wrong shape and with
    /// `InvalidVariance` for the first entry that is non-positive or not
    /// finite.
    pub fn validate(&self, shape: &[usize]) -> Result<(), FabadaError> {
        match self {
            Variance::Scalar(value) => {
                if !is_valid_variance(*value) {
                    return Err(FabadaError::InvalidVariance {
                        index: 0,
                        value: *value,
                    });
                }
            }
            Variance::PerSample(map) => {
                if map.shape() != shape {
                    return Err(FabadaError::ShapeMismatch {
                        observation: shape.to_vec(),
                        variance: map.shape().to_vec(),
                    });
                }
                if let Some((index, &value)) =
                    map.iter().enumerate().find(|(_, v)| !is_valid_variance(**v))
                {
                    return Err(FabadaError::InvalidVariance { index, value });
                }
            }
        }
        Ok(())
    }

    /// Per-sample variance array with the given shape.
    ///
    /// A map is returned as a standard-layout copy; callers validate first.
    pub fn broadcast(&self, shape: &[usize]) -> ArrayD<f64> {
        match self {
            Variance::Scalar(value) => ArrayD::from_elem(IxDyn(shape), *value),
            Variance::PerSample(map) => map.as_standard_layout().into_owned(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Variance::Scalar(_))
    }
}

fn is_valid_variance(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl From<f64> for Variance {
    fn from(value: f64) -> Self {
        Variance::Scalar(value)
    }
}

impl From<ArrayD<f64>> for Variance {
    fn from(map: ArrayD<f64>) -> Self {
        Variance::PerSample(map)
    }
}

impl From<Array2<f64>> for Variance {
    fn from(map: Array2<f64>) -> Self {
        Variance::PerSample(map.into_dyn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_scalar_validation() {
        assert!(Variance::Scalar(1.0).validate(&[3, 3]).is_ok());
        assert_eq!(
            Variance::Scalar(0.0).validate(&[3]),
            Err(FabadaError::InvalidVariance { index: 0, value: 0.0 })
        );
        assert!(Variance::Scalar(f64::INFINITY).validate(&[3]).is_err());
        assert!(Variance::Scalar(f64::NAN).validate(&[3]).is_err());
    }

    #[test]
    fn test_map_shape_mismatch() {
        let variance = Variance::from(Array2::<f64>::ones((4, 5)));
        assert_eq!(
            variance.validate(&[4, 4]),
            Err(FabadaError::ShapeMismatch {
                observation: vec![4, 4],
                variance: vec![4, 5],
            })
        );
    }

    #[test]
    fn test_map_reports_first_bad_entry() {
        let map = Array1::from(vec![1.0, 2.0, -3.0, 0.0]).into_dyn();
        assert_eq!(
            Variance::from(map).validate(&[4]),
            Err(FabadaError::InvalidVariance { index: 2, value: -3.0 })
        );
    }

    #[test]
    fn test_broadcast() {
        let scalar = Variance::from_sigma(2.0).broadcast(&[2, 3]);
        assert_eq!(scalar.shape(), &[2, 3]);
        assert!(scalar.iter().all(|&v| v == 4.0));

        let map = Array2::from_shape_fn((2, 2), |(i, j)| (i * 2 + j + 1) as f64);
        let broadcast = Variance::from(map.clone()).broadcast(&[2, 2]);
        assert_eq!(broadcast, map.into_dyn());
    }
}
