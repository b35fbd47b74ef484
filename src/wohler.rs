//! Wöhler (S-N) curve parameters and single-cycle pseudo-damage (SPEC_FULL
//! §3 "Wöhler curve parameters", §4.5 "Damage").

use crate::error::{RainflowError, Result};

/// Wöhler (S-N) curve used to turn a cycle amplitude into a pseudo-damage
/// contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WohlerParams {
    /// Endurance amplitude, `> 0`.
    sd: f64,
    /// Endurance cycle count, `> 0`.
    nd: f64,
    /// Primary slope, `< 0`.
    k: f64,
    /// Secondary slope (below `SD`). Defaults to `k` (Miner-elementary).
    k2: f64,
    /// Omission amplitude: cycles with `Sa <= omega` contribute no damage.
    omega: f64,
}

impl WohlerParams {
    /// Build and validate Wöhler parameters.
    pub fn new(sd: f64, nd: f64, k: f64, k2: f64, omega: f64) -> Result<Self> {
        if !(sd > 0.0) {
            return Err(RainflowError::InvalidArgument(format!(
                "SD must be > 0, got {sd}"
            )));
        }
        if !(nd > 0.0) {
            return Err(RainflowError::InvalidArgument(format!(
                "ND must be > 0, got {nd}"
            )));
        }
        if !(k < 0.0) {
            return Err(RainflowError::InvalidArgument(format!(
                "k must be < 0, got {k}"
            )));
        }
        if !(omega >= 0.0) {
            return Err(RainflowError::InvalidArgument(format!(
                "omission amplitude must be >= 0, got {omega}"
            )));
        }
        Ok(Self {
            sd,
            nd,
            k,
            k2,
            omega,
        })
    }

    /// Convenience constructor with `k2 = k` (Miner-elementary).
    pub fn elementary(sd: f64, nd: f64, k: f64, omega: f64) -> Result<Self> {
        Self::new(sd, nd, k, k, omega)
    }

    /// Whether `k2 == k` (Miner-elementary, single-slope curve).
    #[inline]
    pub fn is_elementary(&self) -> bool {
        self.k2 == self.k
    }

    #[inline]
    pub const fn sd(&self) -> f64 {
        self.sd
    }

    #[inline]
    pub const fn nd(&self) -> f64 {
        self.nd
    }

    #[inline]
    pub const fn k(&self) -> f64 {
        self.k
    }

    #[inline]
    pub const fn k2(&self) -> f64 {
        self.k2
    }

    #[inline]
    pub const fn omega(&self) -> f64 {
        self.omega
    }

    /// Pseudo-damage contributed by a single cycle of amplitude `sa`
    /// (SPEC_FULL §4.5). Returns `0.0` if `sa <= omega` (below the
    /// omission threshold).
    pub fn damage_for_amplitude(&self, sa: f64) -> f64 {
        if sa <= self.omega {
            return 0.0;
        }
        let slope = if sa > self.sd { self.k } else { self.k2 };
        (slope.abs() * (sa.ln() - self.sd.ln()) - self.nd.ln()).exp()
    }
}
