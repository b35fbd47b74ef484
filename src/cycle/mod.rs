//! Cycle finders (SPEC_FULL §4.3, §4.4): consume confirmed turning points
//! and extract closed hysteresis loops from the residue.
//!
//! Two interchangeable algorithms are implemented, selected by
//! [`CyclePolicy`]: the four-point method ([`four_point`]) and the
//! Clormann-Seeger HCM stack method ([`hcm`]). A third policy,
//! [`CyclePolicy::None`], appends turning points to the residue and never
//! closes a cycle — useful when only the turning-point stream itself is
//! of interest.

pub mod four_point;
pub mod hcm;

use crate::sample::TurningPoint;

/// Selects which algorithm extracts closed cycles from the turning-point
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// ASTM E1049 four-point method. The default.
    #[default]
    FourPoint,
    /// Clormann-Seeger HCM stack method.
    Hcm,
    /// No cycle extraction; turning points accumulate in the residue
    /// indefinitely.
    None,
}

/// One closed hysteresis loop, identified by its two interior turning
/// points (SPEC_FULL §4.3/§4.4: "from" is the earlier-in-time point of
/// the pair, "to" the later).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedCycle {
    pub from: TurningPoint,
    pub to: TurningPoint,
}

impl ClosedCycle {
    #[inline]
    pub fn range(&self) -> f64 {
        (self.to.value - self.from.value).abs()
    }

    #[inline]
    pub fn amplitude(&self) -> f64 {
        self.range() / 2.0
    }
}
