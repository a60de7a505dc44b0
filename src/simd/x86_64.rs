//! x86_64 kernel variants.
//!
//! Each entry point is an `#[arcane]` function: the `X64V3Token` argument
//! proves AVX2 + FMA were detected, and the generic kernel inlined into it
//! is code-generated for that level with `magetypes` vectors.

use crate::distance2::weighted_sum_squares_lanes;
use crate::image::{Image3F, ImageF};
use crate::pnorm::power_sums3_lanes;
use archmage::X64V3Token;
use magetypes::simd::{f32x8, f64x4};

// ============================================================================
// x86-64-v3 (AVX2 + FMA)
// ============================================================================

/// 4 double lanes; samples are widened before cubing.
#[archmage::arcane]
pub(super) fn power_sums3_v3(token: X64V3Token, map: &ImageF, border: usize) -> [f64; 3] {
    power_sums3_lanes::<f64x4>(token, map, border)
}

/// 8 float lanes.
#[archmage::arcane]
pub(super) fn weighted_sum_squares_v3(token: X64V3Token, a: &Image3F, b: &Image3F) -> f64 {
    weighted_sum_squares_lanes::<f32x8>(token, a, b)
}
