//! Numerical helpers shared across the workspace
//!
//! - **parallel**: deterministic, seeded parallel processing of arrays
//! - **stats**: scalar statistics and image quality metrics

pub mod parallel;
pub mod stats;

pub use parallel::process_array_in_parallel_chunks;
pub use stats::{ks_critical_value, ks_test_normal, mean_squared_error, psnr, StatsError};
