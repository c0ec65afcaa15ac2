// src/encode/wavelet/prep.rs

//! Level shift before the transform and integer truncation after it.

use crate::image::raster::Plane;

/// Removes the floored mean of the whole padded plane and returns it.
///
/// Must run once per component, before [`super::transform::dwt2full`].
pub fn sub_dc(plane: &mut Plane) -> i32 {
    let samples = plane.samples_mut();
    let sum: f64 = samples.iter().map(|&v| v as f64).sum();
    let dc = (sum / samples.len() as f64).floor();
    let shift = dc as f32;
    for v in samples.iter_mut() {
        *v -= shift;
    }
    dc as i32
}

/// Truncates every coefficient toward zero (`floor` for non-negative values,
/// `-floor(|v|)` for negative ones).
///
/// Must run once per component, after the transform and before coding.
pub fn normalize(plane: &mut Plane) {
    for v in plane.samples_mut() {
        *v = v.trunc();
    }
}
