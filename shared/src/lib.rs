//! Shared components for the FABADA denoising workspace.
//!
//! This crate holds the array statistics, noise modelling and synthetic
//! image utilities that are used both by the denoising engine's tests and by
//! the command-line tool when a noise level has to be estimated from the
//! data itself.

pub mod algo;
pub mod image_proc;
