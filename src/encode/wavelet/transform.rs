// src/encode/wavelet/transform.rs

//! Forward CDF 9/7 wavelet transform by lifting.
//!
//! The 1D step reads one sequence and writes the decimated result (low band in
//! the first half, high band in the second) into another. The 2D stage runs it
//! over every row from the primary plane into the scratch plane, then over every
//! column from scratch back into primary, so a finished stage always leaves its
//! coefficients in the primary plane. Further stages recurse on the shrinking
//! low/low quadrant.
//!
//! Boundaries: the last predict of the first step mirrors `s[n] = s[n-2]`.
//! `L[0]` takes its two nearest high-band neighbours `H[0]` and `H[1]` in both
//! update steps, and the last high coefficient takes `L[h-1]` and `L[h-2]` in the
//! second predict. A two-sample sequence has only one neighbour on each side,
//! which is then counted twice.

use super::constants::{ALPHA, BETA, DELTA, GAMMA, XI};
use crate::image::raster::Plane;
use log::trace;

/// High-band partner of `L[i]` besides `H[i]`.
#[inline]
fn update_neighbour(i: usize, half: usize) -> usize {
    match i {
        0 if half > 1 => 1,
        0 => 0,
        _ => i - 1,
    }
}

/// Low-band partner of `H[i]` besides `L[i]`.
#[inline]
fn predict_neighbour(i: usize, half: usize) -> usize {
    if i + 1 < half {
        i + 1
    } else {
        i.saturating_sub(1)
    }
}

/// One forward lifting step over `src`, written decimated into `dst`.
///
/// `src.len()` must be even and at least 2.
pub fn lift_forward(src: &[f32], dst: &mut [f32]) {
    let n = src.len();
    assert!(n >= 2 && n % 2 == 0, "lifting needs an even length >= 2, got {}", n);
    assert_eq!(dst.len(), n, "destination length mismatch");
    let half = n / 2;
    let (low, high) = dst.split_at_mut(half);

    // 1-Predict
    for i in 0..half {
        let right = if i + 1 < half { src[2 * i + 2] } else { src[2 * i] };
        high[i] = src[2 * i + 1] + ALPHA * (src[2 * i] + right);
    }

    // 2-Update
    for i in 0..half {
        low[i] = src[2 * i] + BETA * (high[i] + high[update_neighbour(i, half)]);
    }

    // 3-Predict
    for i in 0..half {
        high[i] += GAMMA * (low[i] + low[predict_neighbour(i, half)]);
    }

    // 4-Update
    for i in 0..half {
        low[i] += DELTA * (high[i] + high[update_neighbour(i, half)]);
    }

    for v in low.iter_mut() {
        *v *= XI;
    }
    for v in high.iter_mut() {
        *v /= XI;
    }
}

/// One decomposition stage on the top-left `width x height` region.
pub fn dwt2(primary: &mut Plane, scratch: &mut Plane, width: usize, height: usize) {
    for y in 0..height {
        lift_forward(&primary.row(y)[..width], &mut scratch.row_mut(y)[..width]);
    }

    let mut column = vec![0.0f32; height];
    let mut lifted = vec![0.0f32; height];
    for x in 0..width {
        for (y, v) in column.iter_mut().enumerate() {
            *v = scratch.at(x, y);
        }
        lift_forward(&column, &mut lifted);
        for (y, &v) in lifted.iter().enumerate() {
            *primary.at_mut(x, y) = v;
        }
    }
}

/// Full Mallat pyramid of `num_stages` stages; results end in `primary`.
pub fn dwt2full(primary: &mut Plane, scratch: &mut Plane, num_stages: u32) {
    let mut width = primary.width();
    let mut height = primary.height();
    let block = 1usize << num_stages;
    assert!(
        width % block == 0 && height % block == 0,
        "{}x{} plane is not padded for {} stages",
        width,
        height,
        num_stages
    );
    assert_eq!(
        (scratch.width(), scratch.height()),
        (width, height),
        "scratch plane geometry mismatch"
    );

    for stage in 0..num_stages {
        trace!("dwt stage {} on {}x{}", stage, width, height);
        dwt2(primary, scratch, width, height);
        width /= 2;
        height /= 2;
    }
}
