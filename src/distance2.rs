//! Plane-weighted sum of squared differences ("weighted PSNR distance").
//!
//! Follows the JPEG XL weighted PSNR: on a luma/chroma-like encoding the two
//! chroma-like planes count 1/8 each and the luma-like plane 6/8. The result
//! is a raw sum, not normalized by pixel count; see
//! [`psnr_from_distance2`] for the conversion to decibels.

use crate::consts::{PLANE_WEIGHTS, PSNR_IDENTICAL};
use crate::image::Image3F;
use crate::simd::lanes::{reduce_row, Lanes, PartialAccumulator};
use crate::simd::Kernels;
use crate::PnormError;

/// Computes the weighted sum of squared differences between two images.
///
/// Both images must already be in the same canonical encoding. Every pixel
/// of every plane participates.
///
/// # Panics
/// Panics if the images differ in size. This is a caller bug; use
/// [`try_compute_distance2`] to get an error instead.
#[must_use]
pub fn compute_distance2(a: &Image3F, b: &Image3F) -> f64 {
    if let Err(e) = check_sizes(a, b) {
        panic!("compute_distance2: {e}");
    }
    Kernels::detected().weighted_sum_squares(a, b)
}

/// Like [`compute_distance2`], but reports a size mismatch as an error.
///
/// # Errors
/// Returns [`PnormError::DimensionMismatch`] if the images differ in size.
pub fn try_compute_distance2(a: &Image3F, b: &Image3F) -> Result<f64, PnormError> {
    check_sizes(a, b)?;
    Ok(Kernels::detected().weighted_sum_squares(a, b))
}

/// Every plane of `a` must match the same plane of `b`; the first
/// mismatching pair is reported.
fn check_sizes(a: &Image3F, b: &Image3F) -> Result<(), PnormError> {
    for c in 0..3 {
        let (pa, pb) = (a.plane(c), b.plane(c));
        if !pa.same_size(pb) {
            return Err(PnormError::DimensionMismatch {
                w1: pa.width(),
                h1: pa.height(),
                w2: pb.width(),
                h2: pb.height(),
            });
        }
    }
    Ok(())
}

/// Converts a [`compute_distance2`] result into PSNR (dB) for images with a
/// nominal [0, 1] range.
///
/// The plane weights sum to 1, so the weighted MSE is `distance2 / pixels`.
/// Identical images (and empty ones) report [`PSNR_IDENTICAL`]. A NaN
/// distance stays NaN.
#[must_use]
pub fn psnr_from_distance2(distance2: f64, pixels: usize) -> f64 {
    if distance2.is_nan() {
        return f64::NAN;
    }
    if distance2 <= 0.0 || pixels == 0 {
        return PSNR_IDENTICAL;
    }
    let mse = distance2 / pixels as f64;
    (10.0 * (1.0 / mse).log10()).min(PSNR_IDENTICAL)
}

/// Weighted sum of squared differences accumulated in `V` lanes.
///
/// Sizes must match.
#[inline(always)]
pub(crate) fn weighted_sum_squares_lanes<V: Lanes>(
    token: V::Token,
    a: &Image3F,
    b: &Image3F,
) -> f64 {
    let mut acc = [PartialAccumulator::<V>::new(token)];

    for (c, &w) in PLANE_WEIGHTS.iter().enumerate() {
        let weight = V::splat(token, w);
        for y in 0..a.height() {
            let row_a = a.plane_row(c, y);
            let row_b = b.plane_row(c, y);
            reduce_row(
                token,
                row_a.len(),
                &mut acc,
                |x| {
                    let diff = V::load(token, &row_a[x..]) - V::load(token, &row_b[x..]);
                    [diff * diff * weight]
                },
                |x| {
                    let diff = row_a[x] - row_b[x];
                    [f64::from(diff * diff * w)]
                },
            );
        }
    }

    acc[0].total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF;
    use crate::simd::SimdLevel;

    fn test_image(width: usize, height: usize, offset: f32) -> Image3F {
        let mut img = Image3F::new(width, height);
        for c in 0..3 {
            for y in 0..height {
                for (x, v) in img.plane_mut(c).row_mut(y).iter_mut().enumerate() {
                    *v = ((x * 3 + y * 5 + c) % 11) as f32 / 11.0 + offset;
                }
            }
        }
        img
    }

    #[test]
    fn test_identity() {
        let a = test_image(19, 7, 0.0);
        assert_eq!(compute_distance2(&a, &a), 0.0);
    }

    #[test]
    fn test_luma_plane_weight() {
        let a = Image3F::new(4, 4);
        let mut b = Image3F::new(4, 4);
        b.plane_mut(1).fill(2.0);
        // 16 pixels * 2^2 * 6/8
        assert_eq!(compute_distance2(&a, &b), 48.0);
    }

    #[test]
    fn test_chroma_plane_weight() {
        let a = Image3F::new(5, 3);
        let mut b = Image3F::new(5, 3);
        b.plane_mut(0).fill(1.0);
        b.plane_mut(2).fill(1.0);
        // 15 pixels * 2 planes * 1/8, with a tail on every row
        assert!((compute_distance2(&a, &b) - 3.75).abs() < 1e-9);
    }

    #[test]
    fn test_matches_every_variant() {
        let a = test_image(29, 9, 0.0);
        let b = test_image(29, 9, 0.125);
        // every pixel differs by 0.125 in every plane, weights sum to 1
        let expected = 29.0 * 9.0 * 0.125 * 0.125;
        for level in SimdLevel::available() {
            let kernels = Kernels::for_level(level).unwrap();
            let got = kernels.weighted_sum_squares(&a, &b);
            assert!((got - expected).abs() < 1e-4 * expected, "{level}: {got}");
        }
    }

    #[test]
    #[should_panic(expected = "dimensions don't match")]
    fn test_dimension_mismatch_panics() {
        let _ = compute_distance2(&Image3F::new(4, 4), &Image3F::new(5, 5));
    }

    #[test]
    fn test_try_dimension_mismatch() {
        let err = try_compute_distance2(&Image3F::new(4, 4), &Image3F::new(5, 5)).unwrap_err();
        assert_eq!(
            err,
            PnormError::DimensionMismatch {
                w1: 4,
                h1: 4,
                w2: 5,
                h2: 5
            }
        );
        let a = Image3F::from_planes(
            ImageF::filled(3, 3, 1.0),
            ImageF::new(3, 3),
            ImageF::new(3, 3),
        );
        assert_eq!(try_compute_distance2(&a, &Image3F::new(3, 3)), Ok(9.0 / 8.0));
    }

    #[test]
    fn test_psnr_from_distance2() {
        assert_eq!(psnr_from_distance2(0.0, 16), PSNR_IDENTICAL);
        assert_eq!(psnr_from_distance2(1.0, 0), PSNR_IDENTICAL);
        // MSE 0.01 => 20 dB
        assert!((psnr_from_distance2(0.16, 16) - 20.0).abs() < 1e-9);
        // Tiny errors are capped
        assert_eq!(psnr_from_distance2(1e-30, 1), PSNR_IDENTICAL);
        // Garbage in is not reported as a perfect match
        assert!(psnr_from_distance2(f64::NAN, 16).is_nan());
        assert!(psnr_from_distance2(f64::INFINITY, 16) == f64::NEG_INFINITY);
    }

    #[test]
    fn test_mismatched_plane_reported() {
        let mut a = Image3F::new(4, 4);
        *a.plane_mut(2) = ImageF::new(3, 4);
        let err = try_compute_distance2(&a, &Image3F::new(4, 4)).unwrap_err();
        assert_eq!(
            err,
            PnormError::DimensionMismatch {
                w1: 3,
                h1: 4,
                w2: 4,
                h2: 4
            }
        );
    }
}
