//! Runtime selection of vectorized kernels.
//!
//! Every kernel is compiled once per capability level:
//!
//! ```text
//! simd/
//! ├── mod.rs      # SimdLevel, Kernels, cached detection
//! ├── lanes.rs    # Lanes trait and PartialAccumulator
//! ├── scalar.rs   # baseline, always available
//! ├── x86_64.rs   # x86-64-v3 (AVX2 + FMA), archmage + magetypes
//! └── aarch64.rs  # NEON
//! ```
//!
//! A level is usable once its archmage token can be summoned. The best
//! usable level is picked on first use and its token cached for the
//! lifetime of the process. Summoning only reads CPUID, so racing first
//! callers all compute the same answer; `OnceLock` publishes exactly one.

pub mod lanes;
mod scalar;

#[cfg(target_arch = "x86_64")]
mod x86_64;

#[cfg(target_arch = "aarch64")]
mod aarch64;

use crate::image::{Image3F, ImageF};
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
use archmage::SimdToken;
use std::sync::OnceLock;

/// Instruction-set level a kernel variant is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SimdLevel {
    /// Portable code, no target features assumed.
    Scalar,
    /// x86-64-v3: AVX2 + FMA, 256-bit lanes.
    X64V3,
    /// aarch64 NEON, 128-bit lanes.
    Neon,
}

/// Levels compiled into this build, best first. Scalar is always last.
#[cfg(target_arch = "x86_64")]
const LEVELS: &[SimdLevel] = &[SimdLevel::X64V3, SimdLevel::Scalar];

#[cfg(target_arch = "aarch64")]
const LEVELS: &[SimdLevel] = &[SimdLevel::Neon, SimdLevel::Scalar];

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
const LEVELS: &[SimdLevel] = &[SimdLevel::Scalar];

impl SimdLevel {
    /// Returns true if this build has kernels for this level and the
    /// running CPU can execute them.
    #[must_use]
    pub fn is_supported(self) -> bool {
        Kernels::for_level(self).is_some()
    }

    /// Short human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::X64V3 => "x86-64-v3",
            Self::Neon => "neon",
        }
    }

    /// All levels with a compiled variant that the running CPU supports,
    /// best first. Always ends with [`SimdLevel::Scalar`].
    #[must_use]
    pub fn available() -> Vec<SimdLevel> {
        LEVELS
            .iter()
            .copied()
            .filter(|level| level.is_supported())
            .collect()
    }
}

impl std::fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability proof held by a [`Kernels`] handle.
#[derive(Clone, Copy)]
enum Capability {
    Scalar,
    #[cfg(target_arch = "x86_64")]
    X64V3(archmage::X64V3Token),
    #[cfg(target_arch = "aarch64")]
    Neon(archmage::NeonToken),
}

/// Kernels for one capability level.
///
/// A handle can only be obtained for a level the running CPU supports, so
/// calling its kernels is always sound.
#[derive(Clone, Copy)]
pub struct Kernels {
    level: SimdLevel,
    capability: Capability,
}

impl Kernels {
    const SCALAR: Kernels = Kernels {
        level: SimdLevel::Scalar,
        capability: Capability::Scalar,
    };

    /// Kernels for the best level the running CPU supports.
    #[must_use]
    pub fn detected() -> Kernels {
        *SELECTED.get_or_init(select)
    }

    /// Kernels for a specific level, or `None` if this build has no such
    /// variant or the CPU cannot run it.
    #[must_use]
    pub fn for_level(level: SimdLevel) -> Option<Kernels> {
        let capability = match level {
            SimdLevel::Scalar => Capability::Scalar,
            #[cfg(target_arch = "x86_64")]
            SimdLevel::X64V3 => Capability::X64V3(archmage::X64V3Token::summon()?),
            #[cfg(target_arch = "aarch64")]
            SimdLevel::Neon => Capability::Neon(archmage::NeonToken::summon()?),
            #[allow(unreachable_patterns)]
            _ => return None,
        };
        Some(Kernels { level, capability })
    }

    /// Level these kernels were compiled for.
    #[must_use]
    pub fn level(&self) -> SimdLevel {
        self.level
    }

    /// p=3 power sums `[Σd³, Σd⁶, Σd¹²]` over the map minus `border`
    /// pixels on each edge.
    #[must_use]
    pub fn power_sums3(&self, map: &ImageF, border: usize) -> [f64; 3] {
        match self.capability {
            Capability::Scalar => scalar::power_sums3(map, border),
            #[cfg(target_arch = "x86_64")]
            Capability::X64V3(token) => x86_64::power_sums3_v3(token, map, border),
            #[cfg(target_arch = "aarch64")]
            Capability::Neon(token) => aarch64::power_sums3_neon(token, map, border),
        }
    }

    /// Plane-weighted sum of squared differences over all three planes.
    ///
    /// Callers must have checked that both images have the same size.
    #[must_use]
    pub fn weighted_sum_squares(&self, a: &Image3F, b: &Image3F) -> f64 {
        match self.capability {
            Capability::Scalar => scalar::weighted_sum_squares(a, b),
            #[cfg(target_arch = "x86_64")]
            Capability::X64V3(token) => x86_64::weighted_sum_squares_v3(token, a, b),
            #[cfg(target_arch = "aarch64")]
            Capability::Neon(token) => aarch64::weighted_sum_squares_neon(token, a, b),
        }
    }
}

impl std::fmt::Debug for Kernels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernels")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

static SELECTED: OnceLock<Kernels> = OnceLock::new();

fn select() -> Kernels {
    let kernels = LEVELS
        .iter()
        .find_map(|&level| Kernels::for_level(level))
        .unwrap_or(Kernels::SCALAR);
    tracing::debug!(level = kernels.level.name(), "selected distance kernels");
    kernels
}

/// Capability level used by [`compute_distance_p`](crate::compute_distance_p)
/// and [`compute_distance2`](crate::compute_distance2).
///
/// Detected on the first call and cached for the process lifetime.
#[must_use]
pub fn simd_level() -> SimdLevel {
    Kernels::detected().level
}
