//! Runs the `fabada` binary against FITS files in a scratch directory.

use fabada::io::fits::{read_image, write_image, HduSelector};
use fitsio::compat::fitsfile::FitsFile;
use ndarray::Array2;
use shared::image_proc::noise::add_gaussian_noise;
use shared::image_proc::test_patterns::gaussian_blob;
use std::process::Command;

fn fabada_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fabada"))
}

#[test]
fn test_scalar_noise_with_residuals() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("blob.fits");

    let truth = gaussian_blob((32, 32), (16.0, 16.0), 4.0, 50.0) + 10.0;
    let noisy = add_gaussian_noise(&truth, 2.0, 1).unwrap();
    write_image(&input, "SCI", &noisy.view().into_dyn(), &[]).unwrap();

    let status = fabada_bin()
        .current_dir(dir.path())
        .args(["blob.fits", "4.0", "--hdu", "SCI", "--res", "true", "--iter", "300"])
        .args(["--verbose", "false"])
        .status()
        .unwrap();
    assert!(status.success());

    let estimate = read_image(
        dir.path().join("blob_fabada.fits"),
        &HduSelector::Name("FABADA".into()),
    )
    .unwrap();
    let residuals = read_image(
        dir.path().join("blob_residuals.fits"),
        &HduSelector::Name("RESIDUALS".into()),
    )
    .unwrap();

    assert_eq!(estimate.data.shape(), &[32, 32]);
    let recombined = &estimate.data + &residuals.data;
    for (a, b) in recombined.iter().zip(noisy.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_non_square_primary_image_keeps_orientation() {
    let dir = tempfile::tempdir().unwrap();
    let wide = Array2::from_shape_fn((3, 5), |(i, j)| 100.0 + (i * 5 + j) as f64);
    write_image(dir.path().join("wide.fits"), "SCI", &wide.view().into_dyn(), &[]).unwrap();

    let status = fabada_bin()
        .current_dir(dir.path())
        .args(["wide.fits", "1e-6", "--iter", "1", "--verbose", "false"])
        .status()
        .unwrap();
    assert!(status.success());

    let output = dir.path().join("wide_fabada.fits");
    let fptr = FitsFile::open(&output).unwrap();
    let hdu = fptr.primary_hdu().unwrap();
    assert_eq!(hdu.read_key::<i64>(&fptr, "NAXIS1").unwrap(), 5);
    assert_eq!(hdu.read_key::<i64>(&fptr, "NAXIS2").unwrap(), 3);

    let estimate = read_image(&output, &HduSelector::default()).unwrap();
    assert_eq!(estimate.data.shape(), &[3, 5]);
    for (a, b) in estimate.data.iter().zip(wide.iter()) {
        assert!((a - b).abs() < 1e-3);
    }

    // The estimate is itself a valid input at the default HDU.
    let status = fabada_bin()
        .current_dir(dir.path())
        .args(["wide_fabada.fits", "1.0", "--iter", "5", "--verbose", "false"])
        .status()
        .unwrap();
    assert!(status.success());
    let again = read_image(dir.path().join("wide_fabada_fabada.fits"), &HduSelector::Index(0))
        .unwrap();
    assert_eq!(again.data.shape(), &[3, 5]);
}

#[test]
fn test_variance_map_and_explicit_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("frame.fits");
    let variance = dir.path().join("variance.fits");

    let truth = gaussian_blob((24, 24), (12.0, 12.0), 3.0, 30.0);
    let noisy = add_gaussian_noise(&truth, 1.0, 2).unwrap();
    write_image(&input, "SCI", &noisy.view().into_dyn(), &[]).unwrap();
    let unit_variance = Array2::from_elem((24, 24), 1.0);
    write_image(&variance, "VAR", &unit_variance.view().into_dyn(), &[]).unwrap();

    let status = fabada_bin()
        .current_dir(dir.path())
        .args(["frame.fits", "variance.fits", "--hdu", "SCI", "--noise-hdu", "VAR"])
        .args(["--out", "clean.fits", "--verbose", "false"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(dir.path().join("clean.fits").exists());
    assert!(!dir.path().join("frame_residuals.fits").exists());
}

#[test]
fn test_mismatched_variance_map_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("frame.fits");
    let variance = dir.path().join("variance.fits");

    write_image(&input, "SCI", &Array2::from_elem((8, 8), 5.0).view().into_dyn(), &[]).unwrap();
    write_image(&variance, "VAR", &Array2::from_elem((8, 7), 1.0).view().into_dyn(), &[]).unwrap();

    let output = fabada_bin()
        .current_dir(dir.path())
        .args(["frame.fits", "variance.fits", "--hdu", "SCI", "--noise-hdu", "VAR"])
        .args(["--verbose", "false"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not match"));
}
