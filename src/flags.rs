//! Counting-output flags (SPEC_FULL §6 "Flags (bitmask)").
//!
//! Mirrors the `bitflags!`-based error/safety flag types of the reference
//! workspace (`evo_common::control_unit::error::{PowerError, MotionError}`):
//! a compact bitmask selects which accumulators a [`crate::RainflowEngine`]
//! maintains, so callers that only need a subset (e.g. damage only, no
//! histograms) can skip the bookkeeping.

use bitflags::bitflags;

bitflags! {
    /// Which outputs the engine accumulates while counting cycles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Accumulate the `count x count` rainflow matrix.
        const COUNT_MATRIX    = 0x0001;
        /// Accumulate the range-pair histogram.
        const COUNT_RP        = 0x0002;
        /// Accumulate upward level crossings.
        const COUNT_LC_UP     = 0x0004;
        /// Accumulate downward level crossings.
        const COUNT_LC_DN     = 0x0008;
        /// Force-record the first and last sample as turning points.
        const ENFORCE_MARGIN  = 0x0010;
    }
}

impl Flags {
    /// `COUNT_LC_UP | COUNT_LC_DN`.
    pub const COUNT_LC: Self = Self::COUNT_LC_UP.union(Self::COUNT_LC_DN);

    /// `COUNT_MATRIX | COUNT_RP | COUNT_LC`.
    pub const COUNT_ALL: Self = Self::COUNT_MATRIX
        .union(Self::COUNT_RP)
        .union(Self::COUNT_LC_UP)
        .union(Self::COUNT_LC_DN);
}

impl Default for Flags {
    fn default() -> Self {
        Self::COUNT_ALL
    }
}
