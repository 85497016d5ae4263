//! File I/O for observations, variance maps and denoised products

pub mod fits;

pub use fits::{read_image, write_image, FitsError, FitsImage, HduSelector};
