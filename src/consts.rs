//! Constants shared by the aggregators.

/// Border width in pixels skipped by approximate-border aggregation.
///
/// Smaller than half the widest blur kernel used to build butteraugli
/// diffmaps (37x37), and a multiple of every lane count in use.
pub const APPROXIMATE_BORDER: usize = 8;

/// `|p - 3|` below this selects the p=3 fast path.
pub const FAST_PATH_TOLERANCE: f64 = 1e-6;

/// Per-plane weights applied to squared differences.
///
/// Planes 0 and 2 are chroma-like and count 1/8 each; plane 1 is luma-like.
/// The weights multiply the squared difference, so chroma is not scaled by
/// (1/8)^2, which would be too extreme.
pub const PLANE_WEIGHTS: [f32; 3] = [1.0 / 8.0, 6.0 / 8.0, 1.0 / 8.0];

/// PSNR reported for identical images.
pub const PSNR_IDENTICAL: f64 = 99.99;
