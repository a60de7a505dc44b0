//! Common test utilities for distance aggregation tests.
//!
//! Deterministic generators so failures reproduce without a seed.

#![allow(dead_code)]

use butteraugli_pnorm::consts::APPROXIMATE_BORDER;
use butteraugli_pnorm::{Image3F, ImageF};

/// Simple LCG, good enough for test patterns.
pub struct Lcg(u32);

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self(seed)
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (self.0 >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// Distance map with values uniform in [0, scale).
pub fn random_map(width: usize, height: usize, scale: f32, seed: u32) -> ImageF {
    let mut rng = Lcg::new(seed);
    let mut map = ImageF::new(width, height);
    for y in 0..height {
        for v in map.row_mut(y) {
            *v = rng.next_f32() * scale;
        }
    }
    map
}

/// Map with `interior` inside the approximate border and `frame` on it.
///
/// # Panics
/// Panics if either side is not larger than twice the border.
pub fn framed_map(width: usize, height: usize, interior: f32, frame: f32) -> ImageF {
    assert!(width > 2 * APPROXIMATE_BORDER && height > 2 * APPROXIMATE_BORDER);
    let mut map = ImageF::filled(width, height, frame);
    for y in APPROXIMATE_BORDER..height - APPROXIMATE_BORDER {
        for x in APPROXIMATE_BORDER..width - APPROXIMATE_BORDER {
            map.set(x, y, interior);
        }
    }
    map
}

/// Three-plane image with values uniform in [0, 1).
pub fn random_image(width: usize, height: usize, seed: u32) -> Image3F {
    Image3F::from_planes(
        random_map(width, height, 1.0, seed),
        random_map(width, height, 1.0, seed.wrapping_add(1)),
        random_map(width, height, 1.0, seed.wrapping_add(2)),
    )
}
