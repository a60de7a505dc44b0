//! P-norm aggregation of a distance map.
//!
//! Reduces a per-pixel distance map to one score by blending three norms of
//! the same map: for exponent p, the p-, 2p- and 4p-norms are averaged. The
//! higher norms weight outliers more heavily than a plain mean would, and
//! all three come out of one pass over the map.
//!
//! p = 3 (the value butteraugli reports) has a vectorized fast path that
//! accumulates d³, d⁶ and d¹² in double precision lanes. Any other p falls
//! back to a scalar `powf` loop.

use crate::consts::{APPROXIMATE_BORDER, FAST_PATH_TOLERANCE};
use crate::image::ImageF;
use crate::simd::lanes::{reduce_row, Lanes, PartialAccumulator};
use crate::simd::Kernels;
use crate::AggregationParams;
use std::sync::atomic::{AtomicBool, Ordering};

static SLOW_PATH_WARNED: AtomicBool = AtomicBool::new(false);

/// Returns true for exactly one caller per flag, however many race.
fn fire_once(flag: &AtomicBool) -> bool {
    !flag.swap(true, Ordering::Relaxed)
}

/// Border width to exclude for a `width` x `height` map.
///
/// Maps too small to have an interior (either side <= 2 * border) use no
/// border at all.
#[must_use]
pub fn border_width(width: usize, height: usize, params: &AggregationParams) -> usize {
    let border = if params.approximate_border() {
        APPROXIMATE_BORDER
    } else {
        0
    };
    if width <= 2 * border || height <= 2 * border {
        0
    } else {
        border
    }
}

/// Computes the blended p-norm of `map`.
///
/// Values of `map` must be non-negative. Sums are normalized by the full
/// pixel count even when a border is excluded. An empty map scores 0.
///
/// # Example
/// ```rust
/// use butteraugli_pnorm::{compute_distance_p, AggregationParams, ImageF};
///
/// let map = ImageF::filled(32, 32, 0.5);
/// let d = compute_distance_p(&map, &AggregationParams::default(), 3.0);
/// assert!((d - 0.5).abs() < 1e-6);
/// ```
#[must_use]
pub fn compute_distance_p(map: &ImageF, params: &AggregationParams, p: f64) -> f64 {
    let pixels = map.pixel_count();
    if pixels == 0 {
        return 0.0;
    }
    let border = border_width(map.width(), map.height(), params);

    let sums = if (p - 3.0).abs() < FAST_PATH_TOLERANCE {
        Kernels::detected().power_sums3(map, border)
    } else {
        if fire_once(&SLOW_PATH_WARNED) {
            tracing::warn!(p, "using slow compute_distance_p for p != 3");
        }
        power_sums_generic(map, border, p)
    };
    pnorm_from_sums(sums, p, pixels)
}

/// Averages `(sums[i] / pixels)^(1 / (p * 2^i))` over the three sums.
fn pnorm_from_sums(sums: [f64; 3], p: f64, pixels: usize) -> f64 {
    let one_per_pixels = 1.0 / pixels as f64;
    let mut v = 0.0;
    for (i, sum) in sums.into_iter().enumerate() {
        v += (one_per_pixels * sum).powf(1.0 / (p * f64::from(1u32 << i)));
    }
    v / 3.0
}

/// p=3 power sums `[Σd³, Σd⁶, Σd¹²]` over the interior of `map`,
/// accumulated in `V` lanes.
///
/// When `V` has double lanes, samples are widened before cubing.
#[inline(always)]
pub(crate) fn power_sums3_lanes<V: Lanes>(
    token: V::Token,
    map: &ImageF,
    border: usize,
) -> [f64; 3] {
    let (width, height) = (map.width(), map.height());
    let mut accs = [PartialAccumulator::<V>::new(token); 3];

    for y in border..height - border {
        let row = &map.row(y)[border..width - border];
        reduce_row(
            token,
            row.len(),
            &mut accs,
            |x| {
                let d1 = V::load(token, &row[x..]);
                let d3 = d1 * d1 * d1;
                let d6 = d3 * d3;
                [d3, d6, d6 * d6]
            },
            |x| {
                let d1 = f64::from(row[x]);
                let d3 = d1 * d1 * d1;
                let d6 = d3 * d3;
                [d3, d6, d6 * d6]
            },
        );
    }

    accs.map(PartialAccumulator::total)
}

/// Power sums `[Σd^p, Σd^2p, Σd^4p]` for arbitrary p.
fn power_sums_generic(map: &ImageF, border: usize, p: f64) -> [f64; 3] {
    let (width, height) = (map.width(), map.height());
    let mut sums = [0.0f64; 3];
    for y in border..height - border {
        for &d in &map.row(y)[border..width - border] {
            let mut d2 = f64::from(d).powf(p);
            sums[0] += d2;
            d2 *= d2;
            sums[1] += d2;
            d2 *= d2;
            sums[2] += d2;
        }
    }
    sums
}
