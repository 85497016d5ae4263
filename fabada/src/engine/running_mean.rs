//! Neighbourhood running mean used to build each iteration's prior.
//!
//! The prior for a sample is the average of the current estimate over the
//! 3^N box centred on it, clipped at the array borders. For a spectrum this
//! averages 3 channels inside and 2 at the ends; for an image 9 pixels
//! inside, 6 on an edge and 4 in a corner. The box sum is separable, so it is
//! computed as one 3-tap pass per axis for any dimensionality.

use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Slice};

/// Sum of every sample's clipped 3^N neighbourhood, itself included.
pub(crate) fn neighbourhood_sum<S, D>(data: &ArrayBase<S, D>) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let mut acc = data.to_owned();
    for axis in 0..data.ndim() {
        let axis = Axis(axis);
        if acc.len_of(axis) < 2 {
            continue;
        }

        let before = acc.clone();
        acc.slice_axis_mut(axis, Slice::from(1..))
            .zip_mut_with(&before.slice_axis(axis, Slice::from(..-1)), |a, &b| *a += b);
        acc.slice_axis_mut(axis, Slice::from(..-1))
            .zip_mut_with(&before.slice_axis(axis, Slice::from(1..)), |a, &b| *a += b);
    }
    acc
}

/// Number of samples inside every sample's clipped neighbourhood.
pub(crate) fn neighbourhood_counts<D: Dimension>(shape: D) -> Array<f64, D> {
    neighbourhood_sum(&Array::<f64, D>::ones(shape))
}

/// Mean of every sample's clipped 3^N neighbourhood.
///
/// Works for arrays of any dimensionality; the output has the input's shape.
pub fn running_mean<S, D>(data: &ArrayBase<S, D>) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    neighbourhood_sum(data) / neighbourhood_counts(data.raw_dim())
}
