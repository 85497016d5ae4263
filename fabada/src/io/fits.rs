//! FITS image I/O
//!
//! Reads N-dimensional images from a Header Data Unit selected by index or
//! `EXTNAME`, and writes double-precision image HDUs with identifying header
//! cards. FITS stores `NAXIS1` as the fastest-varying axis, so the ndarray
//! shape is the reversed `NAXISn` list and the sample order is unchanged.

use fitsio::compat::fitsfile::FitsFile;
use fitsio::compat::hdu::FitsHdu;
use fitsio::compat::images::{ImageDescription, ImageType, ReadImage, WriteImage};
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during FITS file operations
#[derive(Error, Debug)]
pub enum FitsError {
    #[error("FITS I/O error: {0}")]
    FitsIo(#[from] fitsio::compat::errors::Error),
    #[error("HDU not found: {0}")]
    HduNotFound(String),
    #[error("Invalid data type in HDU: {0}")]
    InvalidDataType(String),
}

/// Which HDU of a file to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HduSelector {
    /// Zero-based position in the file; 0 is the primary HDU.
    Index(usize),
    /// Extension whose `EXTNAME` matches, ignoring surrounding blanks.
    Name(String),
}

impl Default for HduSelector {
    fn default() -> Self {
        HduSelector::Index(0)
    }
}

impl FromStr for HduSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("HDU selector cannot be empty".to_string());
        }
        Ok(match s.parse::<usize>() {
            Ok(index) => HduSelector::Index(index),
            Err(_) => HduSelector::Name(s.to_string()),
        })
    }
}

impl fmt::Display for HduSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HduSelector::Index(index) => write!(f, "{index}"),
            HduSelector::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Image data read from one HDU
#[derive(Debug, Clone)]
pub struct FitsImage {
    /// Position of the HDU in the file
    pub hdu_index: usize,
    /// `EXTNAME` of the HDU, if any
    pub name: Option<String>,
    /// Samples in row-major order, shape `[NAXISn, ..., NAXIS1]`
    pub data: ArrayD<f64>,
}

/// Read the image stored in the selected HDU.
///
/// Integer images are converted to `f64`.
pub fn read_image<P: AsRef<Path>>(path: P, selector: &HduSelector) -> Result<FitsImage, FitsError> {
    let fptr = FitsFile::open(&path)?;
    let (hdu_index, hdu) = locate_hdu(&fptr, selector)?;

    let name = hdu
        .read_key::<String>(&fptr, "EXTNAME")
        .ok()
        .map(|n| n.trim().to_string());

    let naxis = hdu.read_key::<i64>(&fptr, "NAXIS").unwrap_or(0);
    if naxis <= 0 {
        return Err(FitsError::InvalidDataType(format!(
            "HDU {hdu_index} of {} contains no image data",
            path.as_ref().display()
        )));
    }

    let mut shape = Vec::with_capacity(naxis as usize);
    for axis in (1..=naxis).rev() {
        let key = format!("NAXIS{axis}");
        let len = hdu.read_key::<i64>(&fptr, &key).map_err(|_| {
            FitsError::InvalidDataType(format!("HDU {hdu_index} is missing {key}"))
        })?;
        shape.push(len.max(0) as usize);
    }

    let samples = f64::read_image(&fptr, &hdu)?;
    let data = ArrayD::from_shape_vec(IxDyn(&shape), samples).map_err(|_| {
        FitsError::InvalidDataType(format!(
            "Cannot reshape image data for HDU {hdu_index} into {shape:?}"
        ))
    })?;

    Ok(FitsImage {
        hdu_index,
        name,
        data,
    })
}

fn locate_hdu(fptr: &FitsFile, selector: &HduSelector) -> Result<(usize, FitsHdu), FitsError> {
    match selector {
        HduSelector::Index(index) => fptr
            .hdu(*index)
            .map(|hdu| (*index, hdu))
            .map_err(|_| FitsError::HduNotFound(format!("index {index}"))),
        HduSelector::Name(wanted) => {
            let mut hdu_idx = 0;
            while let Ok(hdu) = fptr.hdu(hdu_idx) {
                let matches = hdu
                    .read_key::<String>(fptr, "EXTNAME")
                    .map(|name| name.trim().eq_ignore_ascii_case(wanted))
                    .unwrap_or(false);
                if matches {
                    return Ok((hdu_idx, hdu));
                }
                hdu_idx += 1;
            }
            Err(FitsError::HduNotFound(format!("EXTNAME {wanted}")))
        }
    }
}

/// Write an image to a new FITS file, replacing any existing file.
///
/// The image is the primary HDU, stored as 64-bit floats and tagged with
/// `EXTNAME = extname`; every `(keyword, value)` pair in `cards` is written to
/// its header. The ndarray shape is row-major, so its last axis becomes
/// `NAXIS1`.
pub fn write_image<P: AsRef<Path>>(
    path: P,
    extname: &str,
    data: &ArrayViewD<'_, f64>,
    cards: &[(&str, String)],
) -> Result<(), FitsError> {
    if data.ndim() == 0 || data.is_empty() {
        return Err(FitsError::InvalidDataType(
            "cannot write an empty image".to_string(),
        ));
    }

    let image_description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: data.shape(),
    };

    let mut fptr = FitsFile::create(&path)
        .with_custom_primary(&image_description)
        .overwrite()
        .open()?;
    let hdu = fptr.primary_hdu()?;

    let flat_data: Vec<f64> = data.iter().copied().collect();
    f64::write_image(&mut fptr, &hdu, &flat_data)?;

    hdu.write_key(&mut fptr, "EXTNAME", extname)?;
    for (keyword, value) in cards {
        hdu.write_key(&mut fptr, keyword, value.as_str())?;
    }
    fptr.flush()?;

    Ok(())
}
