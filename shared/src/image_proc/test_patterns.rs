//! Deterministic ground-truth signals for denoising experiments
//!
//! Noise-free spectra and images with smooth and sharp structure. Adding
//! noise from [`crate::image_proc::noise`] to these gives observations whose
//! reconstruction error can be measured exactly.

use ndarray::{Array1, Array2};

/// A circular Gaussian point source in a [`star_field`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarSpec {
    /// Row coordinate of the centre, in pixels
    pub y: f64,
    /// Column coordinate of the centre, in pixels
    pub x: f64,
    /// Peak amplitude above the background
    pub amplitude: f64,
    /// Gaussian width in pixels
    pub sigma: f64,
}

/// Generate a Gaussian blob
///
/// # Arguments
/// * `shape` - (height, width) of the image
/// * `center` - (row, column) of the peak
/// * `sigma` - Standard deviation of the Gaussian in pixels
/// * `amplitude` - Peak amplitude
pub fn gaussian_blob(
    shape: (usize, usize),
    center: (f64, f64),
    sigma: f64,
    amplitude: f64,
) -> Array2<f64> {
    let two_sigma_sq = 2.0 * sigma * sigma;
    Array2::from_shape_fn(shape, |(y, x)| {
        let dy = y as f64 - center.0;
        let dx = x as f64 - center.1;
        amplitude * (-(dx * dx + dy * dy) / two_sigma_sq).exp()
    })
}

/// Generate a star field: flat background plus Gaussian point sources
pub fn star_field(shape: (usize, usize), background: f64, stars: &[StarSpec]) -> Array2<f64> {
    let mut image = Array2::from_elem(shape, background);
    for star in stars {
        image += &gaussian_blob(shape, (star.y, star.x), star.sigma, star.amplitude);
    }
    image
}

/// Generate a 1-D spectrum: constant continuum plus Gaussian emission lines
///
/// # Arguments
/// * `len` - Number of spectral channels
/// * `continuum` - Constant continuum level
/// * `lines` - (centre, sigma, amplitude) of each line, in channels
pub fn gaussian_line_spectrum(
    len: usize,
    continuum: f64,
    lines: &[(f64, f64, f64)],
) -> Array1<f64> {
    Array1::from_shape_fn(len, |i| {
        let x = i as f64;
        continuum
            + lines
                .iter()
                .map(|&(center, sigma, amplitude)| {
                    amplitude * (-(x - center).powi(2) / (2.0 * sigma * sigma)).exp()
                })
                .sum::<f64>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_blob_peak_and_symmetry() {
        let blob = gaussian_blob((21, 21), (10.0, 10.0), 2.0, 100.0);
        assert_relative_eq!(blob[[10, 10]], 100.0);
        assert_relative_eq!(blob[[10, 7]], blob[[10, 13]]);
        assert_relative_eq!(blob[[7, 10]], blob[[13, 10]]);
        assert!(blob[[0, 0]] < 1e-6);
    }

    #[test]
    fn test_star_field_adds_sources_on_background() {
        let stars = [
            StarSpec { y: 5.0, x: 5.0, amplitude: 50.0, sigma: 1.0 },
            StarSpec { y: 20.0, x: 25.0, amplitude: 80.0, sigma: 1.5 },
        ];
        let field = star_field((32, 32), 10.0, &stars);

        assert_eq!(field.dim(), (32, 32));
        assert_relative_eq!(field[[5, 5]], 60.0, epsilon = 1e-6);
        assert_relative_eq!(field[[20, 25]], 90.0, epsilon = 1e-6);
        assert!(field.iter().all(|&v| v >= 10.0));
    }

    #[test]
    fn test_line_spectrum() {
        let spectrum = gaussian_line_spectrum(200, 1.0, &[(50.0, 3.0, 10.0), (150.0, 5.0, 4.0)]);
        assert_eq!(spectrum.len(), 200);
        assert_relative_eq!(spectrum[50], 11.0, epsilon = 1e-9);
        assert_relative_eq!(spectrum[150], 5.0, epsilon = 1e-9);
        assert_relative_eq!(spectrum[100], 1.0, epsilon = 1e-9);
    }
}
