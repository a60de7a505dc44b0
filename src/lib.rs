//! # butteraugli-pnorm
//!
//! Scalar reductions used when evaluating lossy image codecs:
//!
//! - [`compute_distance_p`]: blended p-norm of a per-pixel distance map
//!   (for example a butteraugli diffmap). p = 3 is the butteraugli
//!   "3-norm" and has a vectorized fast path.
//! - [`compute_distance2`]: chroma-weighted sum of squared differences
//!   between two 3-plane images, the input to a weighted PSNR.
//!
//! Both run a vectorized kernel chosen once per process for the running CPU
//! (see [`simd_level`]), with a portable scalar kernel as fallback.
//!
//! ## Example
//!
//! ```rust
//! use butteraugli_pnorm::{
//!     compute_distance2, compute_distance_p, psnr_from_distance2, AggregationParams, Image3F,
//!     ImageF,
//! };
//!
//! // Distance map produced elsewhere
//! let diffmap = ImageF::filled(64, 64, 0.8);
//! let params = AggregationParams::new().with_approximate_border(true);
//! let pnorm = compute_distance_p(&diffmap, &params, 3.0);
//! assert!(pnorm > 0.0);
//!
//! // Two images already in the canonical encoding
//! let reference = Image3F::new(64, 64);
//! let mut distorted = Image3F::new(64, 64);
//! distorted.plane_mut(1).fill(0.01);
//! let d2 = compute_distance2(&reference, &distorted);
//! let psnr = psnr_from_distance2(d2, 64 * 64);
//! assert!(psnr > 40.0);
//! ```
//!
//! ## Features
//!
//! - **`internals`**: Expose kernel tables and lane primitives for
//!   benchmarking (unstable API)
//!
//! ## References
//!
//! - <https://github.com/libjxl/libjxl>

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::inline_always)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]

pub mod consts;
mod distance2;
pub mod image;
mod pnorm;

// Internal modules - exposed with "internals" feature for benchmarking
#[cfg(feature = "internals")]
pub mod simd;
#[cfg(not(feature = "internals"))]
pub(crate) mod simd;

pub use crate::consts::PSNR_IDENTICAL;
pub use crate::distance2::{compute_distance2, psnr_from_distance2, try_compute_distance2};
pub use crate::image::{Image3F, ImageF};
pub use crate::pnorm::{border_width, compute_distance_p};
pub use crate::simd::{simd_level, SimdLevel};

// Re-export imgref and rgb types for convenience
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::{RGB, RGB8};

/// Error type for distance operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PnormError {
    /// Image dimensions don't match.
    #[error("image dimensions don't match: {w1}x{h1} vs {w2}x{h2}")]
    DimensionMismatch {
        /// First image width.
        w1: usize,
        /// First image height.
        h1: usize,
        /// Second image width.
        w2: usize,
        /// Second image height.
        h2: usize,
    },
    /// Buffer size doesn't match the image dimensions.
    #[error("buffer size {actual} doesn't match expected size {expected}")]
    InvalidBufferSize {
        /// Expected buffer size.
        expected: usize,
        /// Actual buffer size.
        actual: usize,
    },
}

/// Aggregation parameters for [`compute_distance_p`].
///
/// Use the builder pattern to construct:
/// ```rust
/// use butteraugli_pnorm::AggregationParams;
///
/// let params = AggregationParams::new().with_approximate_border(true);
/// assert!(params.approximate_border());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationParams {
    approximate_border: bool,
}

impl AggregationParams {
    /// Creates a new `AggregationParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to skip an 8-pixel border on every edge.
    ///
    /// Distance maps built with blurs that treat out-of-image samples as
    /// zero are unreliable near the edges. Maps with a side of 16 pixels or
    /// less keep their border regardless.
    #[must_use]
    pub fn with_approximate_border(mut self, approximate_border: bool) -> Self {
        self.approximate_border = approximate_border;
        self
    }

    /// Returns whether the approximate border is skipped.
    #[must_use]
    pub fn approximate_border(&self) -> bool {
        self.approximate_border
    }
}
