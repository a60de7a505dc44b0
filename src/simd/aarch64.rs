//! aarch64 kernel variants.
//!
//! NEON is part of the aarch64 baseline, so `wide` already compiles to NEON
//! here; the token only gates entry like on other targets.

use crate::distance2::weighted_sum_squares_lanes;
use crate::image::{Image3F, ImageF};
use crate::pnorm::power_sums3_lanes;
use archmage::NeonToken;
use wide::{f32x4, f64x2};

/// 2 double lanes; samples are widened before cubing.
#[archmage::arcane]
pub(super) fn power_sums3_neon(_token: NeonToken, map: &ImageF, border: usize) -> [f64; 3] {
    power_sums3_lanes::<f64x2>((), map, border)
}

/// 4 float lanes.
#[archmage::arcane]
pub(super) fn weighted_sum_squares_neon(_token: NeonToken, a: &Image3F, b: &Image3F) -> f64 {
    weighted_sum_squares_lanes::<f32x4>((), a, b)
}
