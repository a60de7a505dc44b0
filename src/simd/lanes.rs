//! Fixed-width lane types and the partial-sum reduction shared by all kernels.
//!
//! A kernel is written once, generic over [`Lanes`], and instantiated per
//! capability level with the widest vector type that level supports. Plain
//! `f32`/`f64` act as one-lane vectors for the scalar variant.
//!
//! Each row is split into full `LANES`-wide groups, which accumulate into
//! vector partial sums, and a tail of fewer than `LANES` samples, which is
//! accumulated with scalar `f64` arithmetic into the same logical total.

use std::ops::{Add, Mul, Sub};
use wide::{f32x4, f32x8, f64x2, f64x4};

/// A vector of `LANES` accumulator values.
///
/// Samples are always stored as `f32`; [`Lanes::load`] widens them when the
/// lane precision is `f64`. Vector types that are only valid on some CPUs
/// take a capability token as proof before any value can be built.
pub trait Lanes: Copy + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> {
    /// Proof that the running CPU can execute this type's instructions.
    type Token: Copy;

    /// Number of samples processed per group.
    const LANES: usize;

    /// All lanes zero.
    fn zero(token: Self::Token) -> Self;

    /// All lanes set to `v`.
    fn splat(token: Self::Token, v: f32) -> Self;

    /// Loads the first `LANES` samples of `src`.
    ///
    /// # Panics
    /// Panics if `src` holds fewer than `LANES` samples.
    fn load(token: Self::Token, src: &[f32]) -> Self;

    /// Sums all lanes in double precision, lane 0 first.
    fn horizontal_sum(self) -> f64;
}

#[inline(always)]
fn take<const N: usize>(src: &[f32]) -> [f32; N] {
    std::array::from_fn(|i| src[i])
}

impl Lanes for f32 {
    type Token = ();
    const LANES: usize = 1;

    #[inline(always)]
    fn zero(_: ()) -> Self {
        0.0
    }

    #[inline(always)]
    fn splat(_: (), v: f32) -> Self {
        v
    }

    #[inline(always)]
    fn load(_: (), src: &[f32]) -> Self {
        src[0]
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f64 {
        f64::from(self)
    }
}

impl Lanes for f64 {
    type Token = ();
    const LANES: usize = 1;

    #[inline(always)]
    fn zero(_: ()) -> Self {
        0.0
    }

    #[inline(always)]
    fn splat(_: (), v: f32) -> Self {
        f64::from(v)
    }

    #[inline(always)]
    fn load(_: (), src: &[f32]) -> Self {
        f64::from(src[0])
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f64 {
        self
    }
}

// `wide` picks its backend at compile time, so these are only used where the
// backend is baseline for the target (NEON on aarch64) or for reference.

impl Lanes for f32x4 {
    type Token = ();
    const LANES: usize = 4;

    #[inline(always)]
    fn zero(_: ()) -> Self {
        f32x4::splat(0.0)
    }

    #[inline(always)]
    fn splat(_: (), v: f32) -> Self {
        f32x4::splat(v)
    }

    #[inline(always)]
    fn load(_: (), src: &[f32]) -> Self {
        f32x4::from(take::<4>(src))
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f64 {
        self.to_array().iter().map(|&v| f64::from(v)).sum()
    }
}

impl Lanes for f32x8 {
    type Token = ();
    const LANES: usize = 8;

    #[inline(always)]
    fn zero(_: ()) -> Self {
        f32x8::splat(0.0)
    }

    #[inline(always)]
    fn splat(_: (), v: f32) -> Self {
        f32x8::splat(v)
    }

    #[inline(always)]
    fn load(_: (), src: &[f32]) -> Self {
        f32x8::from(take::<8>(src))
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f64 {
        self.to_array().iter().map(|&v| f64::from(v)).sum()
    }
}

impl Lanes for f64x2 {
    type Token = ();
    const LANES: usize = 2;

    #[inline(always)]
    fn zero(_: ()) -> Self {
        f64x2::splat(0.0)
    }

    #[inline(always)]
    fn splat(_: (), v: f32) -> Self {
        f64x2::splat(f64::from(v))
    }

    #[inline(always)]
    fn load(_: (), src: &[f32]) -> Self {
        f64x2::from(take::<2>(src).map(f64::from))
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f64 {
        self.to_array().iter().sum()
    }
}

impl Lanes for f64x4 {
    type Token = ();
    const LANES: usize = 4;

    #[inline(always)]
    fn zero(_: ()) -> Self {
        f64x4::splat(0.0)
    }

    #[inline(always)]
    fn splat(_: (), v: f32) -> Self {
        f64x4::splat(f64::from(v))
    }

    #[inline(always)]
    fn load(_: (), src: &[f32]) -> Self {
        f64x4::from(take::<4>(src).map(f64::from))
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f64 {
        self.to_array().iter().sum()
    }
}

/// AVX2+FMA vectors, only constructible with an [`archmage::X64V3Token`].
#[cfg(target_arch = "x86_64")]
mod x64v3 {
    use super::{take, Lanes};
    use archmage::X64V3Token;
    use magetypes::simd::{f32x8, f64x4};

    impl Lanes for f32x8 {
        type Token = X64V3Token;
        const LANES: usize = 8;

        #[inline(always)]
        fn zero(token: X64V3Token) -> Self {
            f32x8::splat(token, 0.0)
        }

        #[inline(always)]
        fn splat(token: X64V3Token, v: f32) -> Self {
            f32x8::splat(token, v)
        }

        #[inline(always)]
        fn load(token: X64V3Token, src: &[f32]) -> Self {
            f32x8::load(token, &take::<8>(src))
        }

        #[inline(always)]
        fn horizontal_sum(self) -> f64 {
            self.to_array().iter().map(|&v| f64::from(v)).sum()
        }
    }

    impl Lanes for f64x4 {
        type Token = X64V3Token;
        const LANES: usize = 4;

        #[inline(always)]
        fn zero(token: X64V3Token) -> Self {
            f64x4::splat(token, 0.0)
        }

        #[inline(always)]
        fn splat(token: X64V3Token, v: f32) -> Self {
            f64x4::splat(token, f64::from(v))
        }

        #[inline(always)]
        fn load(token: X64V3Token, src: &[f32]) -> Self {
            f64x4::from_array(token, take::<4>(src).map(f64::from))
        }

        #[inline(always)]
        fn horizontal_sum(self) -> f64 {
            self.to_array().iter().sum()
        }
    }
}

/// Per-lane partial sums plus a scalar carry for samples outside full groups.
///
/// Lives for the duration of one aggregation call.
#[derive(Debug, Clone, Copy)]
pub struct PartialAccumulator<V: Lanes> {
    lanes: V,
    carry: f64,
}

impl<V: Lanes> PartialAccumulator<V> {
    /// Creates an empty accumulator.
    #[inline(always)]
    #[must_use]
    pub fn new(token: V::Token) -> Self {
        Self {
            lanes: V::zero(token),
            carry: 0.0,
        }
    }

    /// Folds a vector partial sum into the lane totals.
    #[inline(always)]
    pub fn add_lanes(&mut self, partial: V) {
        self.lanes = self.lanes + partial;
    }

    /// Adds a tail contribution to the scalar carry.
    #[inline(always)]
    pub fn add_scalar(&mut self, value: f64) {
        self.carry += value;
    }

    /// Horizontal sum of the lane totals plus the carry.
    #[inline(always)]
    #[must_use]
    pub fn total(self) -> f64 {
        self.lanes.horizontal_sum() + self.carry
    }
}

/// Reduces one row of `len` samples into `K` accumulators.
///
/// `group(x)` returns the `K` vector terms for samples `x..x + V::LANES`;
/// `tail(x)` returns the `K` scalar terms for the single sample `x`. Vector
/// terms are summed in registers for the whole row and folded into `accs`
/// once, after which the tail goes to the scalar carry.
#[inline(always)]
pub fn reduce_row<V: Lanes, const K: usize>(
    token: V::Token,
    len: usize,
    accs: &mut [PartialAccumulator<V>; K],
    mut group: impl FnMut(usize) -> [V; K],
    mut tail: impl FnMut(usize) -> [f64; K],
) {
    let mut sums = [V::zero(token); K];
    let mut x = 0;
    while x + V::LANES <= len {
        let terms = group(x);
        for (sum, term) in sums.iter_mut().zip(terms) {
            *sum = *sum + term;
        }
        x += V::LANES;
    }
    for (acc, sum) in accs.iter_mut().zip(sums) {
        acc.add_lanes(sum);
    }

    for x in x..len {
        for (acc, term) in accs.iter_mut().zip(tail(x)) {
            acc.add_scalar(term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_sum<V: Lanes<Token = ()>>(row: &[f32]) -> f64 {
        let mut accs = [PartialAccumulator::<V>::new(())];
        reduce_row(
            (),
            row.len(),
            &mut accs,
            |x| [V::load((), &row[x..])],
            |x| [f64::from(row[x])],
        );
        accs[0].total()
    }

    #[test]
    fn test_reduce_row_covers_every_sample() {
        // 13 leaves a tail for every lane count above 1
        let row: Vec<f32> = (1..=13).map(|v| v as f32).collect();
        let expected = 91.0;
        assert_eq!(row_sum::<f32>(&row), expected);
        assert_eq!(row_sum::<f64>(&row), expected);
        assert_eq!(row_sum::<f32x4>(&row), expected);
        assert_eq!(row_sum::<f32x8>(&row), expected);
        assert_eq!(row_sum::<f64x2>(&row), expected);
        assert_eq!(row_sum::<f64x4>(&row), expected);
    }

    #[test]
    fn test_reduce_row_short_row_is_all_tail() {
        let row = [2.0f32, 3.0, 4.0];
        assert_eq!(row_sum::<f32x8>(&row), 9.0);
        assert_eq!(row_sum::<f32x8>(&[]), 0.0);
    }

    #[test]
    fn test_accumulator_carry() {
        let mut acc = PartialAccumulator::<f64x2>::new(());
        acc.add_lanes(f64x2::from([1.0, 2.0]));
        acc.add_lanes(f64x2::from([3.0, 4.0]));
        acc.add_scalar(0.5);
        assert_eq!(acc.total(), 10.5);
    }

    #[test]
    fn test_load_widens() {
        let src = [0.1f32, 0.2, 0.3, 0.4];
        let v = <f64x4 as Lanes>::load((), &src).to_array();
        assert_eq!(v[2], f64::from(0.3f32));
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_reduce_row_x64v3() {
        use archmage::{SimdToken, X64V3Token};
        use magetypes::simd::{f32x8 as m32x8, f64x4 as m64x4};

        let Some(token) = X64V3Token::summon() else {
            return;
        };
        let row: Vec<f32> = (1..=13).map(|v| v as f32).collect();

        let mut double_accs = [PartialAccumulator::<m64x4>::new(token)];
        reduce_row(
            token,
            row.len(),
            &mut double_accs,
            |x| [<m64x4 as Lanes>::load(token, &row[x..])],
            |x| [f64::from(row[x])],
        );
        assert_eq!(double_accs[0].total(), 91.0);

        let mut single_accs = [PartialAccumulator::<m32x8>::new(token)];
        reduce_row(
            token,
            row.len(),
            &mut single_accs,
            |x| [<m32x8 as Lanes>::load(token, &row[x..])],
            |x| [f64::from(row[x])],
        );
        assert_eq!(single_accs[0].total(), 91.0);
    }
}
