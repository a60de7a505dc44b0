//! Portable baseline kernels.
//!
//! One-lane instantiations of the generic kernels. Power sums promote to
//! `f64`; the weighted sum stays in `f32` until the final reduction, like the
//! vector variants.

use crate::distance2::weighted_sum_squares_lanes;
use crate::image::{Image3F, ImageF};
use crate::pnorm::power_sums3_lanes;

pub(super) fn power_sums3(map: &ImageF, border: usize) -> [f64; 3] {
    power_sums3_lanes::<f64>((), map, border)
}

pub(super) fn weighted_sum_squares(a: &Image3F, b: &Image3F) -> f64 {
    weighted_sum_squares_lanes::<f32>((), a, b)
}
