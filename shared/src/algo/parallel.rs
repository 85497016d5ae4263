//! Parallel processing utilities for image and array operations
//!
//! Arrays of any dimensionality are split along their outermost axis and the
//! chunks are processed on the rayon pool. Every chunk receives its own RNG
//! derived from a base seed, so results do not depend on thread scheduling.

use ndarray::{Array, ArrayViewMut, Axis, Dimension, RemoveAxis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Default number of outer-axis slices handed to one worker.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Process an array in parallel chunks with deterministic seeding
///
/// The array is split into chunks of `chunk_size` slices along `Axis(0)`
/// (rows for images, planes for cubes). Chunk `i` is processed with an RNG
/// seeded from `seed + i`, which makes the output reproducible for a given
/// seed and chunk size regardless of how many threads run.
///
/// # Arguments
/// * `array` - The array to process, consumed and returned
/// * `seed` - Base seed for random number generation
/// * `chunk_size` - Optional number of outer slices per chunk, defaults to 64
/// * `processor` - Closure applied to every chunk with its own RNG
pub fn process_array_in_parallel_chunks<D, F>(
    mut array: Array<f64, D>,
    seed: u64,
    chunk_size: Option<usize>,
    processor: F,
) -> Array<f64, D>
where
    D: Dimension + RemoveAxis,
    F: Fn(&mut ArrayViewMut<'_, f64, D>, &mut StdRng) + Send + Sync,
{
    if array.ndim() == 0 || array.is_empty() {
        return array;
    }

    let chunk_size = chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE).max(1);

    array
        .axis_chunks_iter_mut(Axis(0), chunk_size)
        .into_par_iter()
        .enumerate()
        .for_each(|(chunk_idx, mut chunk)| {
            let chunk_seed = seed.wrapping_add(chunk_idx as u64);
            let mut rng = StdRng::seed_from_u64(chunk_seed);
            processor(&mut chunk, &mut rng);
        });

    array
}
