//! Residue-finalization policies (SPEC_FULL §4.7): how still-open cycles
//! are handled at stream end, after the interim turning point (if any)
//! is promoted into the residue.

use crate::cycle::ClosedCycle;
use crate::sample::TurningPoint;

/// Residue policy, with the canonical numeric codes from SPEC_FULL §6
/// ("Residue-method codes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResiduePolicy {
    /// Retain the residue untouched; no further counting.
    #[default]
    None = 0,
    /// Alias of `None` in this port (SPEC_FULL §4.7 treats them
    /// identically).
    Ignore = 1,
    /// Clear the residue; no further counting.
    Discard = 2,
    /// Count each adjacent residue pair as a half cycle.
    HalfCycles = 3,
    /// Count each adjacent residue pair as a full cycle.
    FullCycles = 4,
    /// 4PTM-style sweep for Clormann-Seeger-shaped quadruples; remainder
    /// counted as half cycles.
    ClormannSeeger = 5,
    /// Adjacent-slope range-pair/level-crossing-only counting (DIN 45667).
    RpDin45667 = 6,
    /// Re-feed the residue as fresh input, then finalize with `Ignore`.
    Repeated = 7,
}

/// One pairing extracted from the residue by a finalizer that does not
/// go through a cycle finder (`HalfCycles`/`FullCycles`/`RpDin45667`),
/// alongside whether it represents a genuine (full) or half-weight
/// closure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResiduePair {
    pub cycle: ClosedCycle,
    pub is_half: bool,
}

/// Sweep adjacent residue pairs `(residue[i], residue[i+1])` and return
/// one [`ResiduePair`] per pair, all weighted per `is_half`. Used by
/// `HalfCycles` and `FullCycles`.
pub fn adjacent_pairs(residue: &[TurningPoint], is_half: bool) -> Vec<ResiduePair> {
    residue
        .windows(2)
        .map(|w| ResiduePair {
            cycle: ClosedCycle { from: w[0], to: w[1] },
            is_half,
        })
        .collect()
}

/// `CLORMANN_SEEGER` finalizer sweep (SPEC_FULL §4.7): scan quadruples
/// `(A,B,C,D)` looking for `B*C < 0 && |D| >= |B| >= |C|`; each match
/// closes `B -> C` and removes both from the residue, then the scan
/// restarts from the new trailing window. Whatever remains afterward is
/// returned for half-cycle counting by the caller.
///
/// The reference's `idx = residue_cnt + i` indexing (SPEC_FULL §9, open
/// question (a)) is read here per its evident intent: `idx = i`.
pub fn clormann_seeger_sweep(
    residue: &mut Vec<TurningPoint>,
    mut on_cycle: impl FnMut(ClosedCycle),
) {
    let mut i = 0usize;
    while i + 3 < residue.len() {
        let b = residue[i + 1];
        let c = residue[i + 2];
        let d = residue[i + 3];
        if b.value * c.value < 0.0 && d.value.abs() >= b.value.abs() && b.value.abs() >= c.value.abs()
        {
            on_cycle(ClosedCycle { from: b, to: c });
            residue.remove(i + 2);
            residue.remove(i + 1);
            // Re-examine from the same index: removing a pair may expose
            // a new closeable quadruple anchored here.
            continue;
        }
        i += 1;
    }
}

/// `RP_DIN45667` finalizer sweep: matches adjacent slopes of equal
/// magnitude and opposite sign.
pub fn din45667_sweep(residue: &[TurningPoint]) -> Vec<ResiduePair> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i + 2 < residue.len() {
        let a = residue[i];
        let b = residue[i + 1];
        let c = residue[i + 2];
        let up = b.value - a.value;
        let down = c.value - b.value;
        if (up + down).abs() < 1e-12 && up.signum() != down.signum() {
            out.push(ResiduePair {
                cycle: ClosedCycle { from: a, to: b },
                is_half: false,
            });
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}
