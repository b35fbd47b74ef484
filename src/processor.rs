//! Cycle processor (SPEC_FULL §4.5): turns one closed cycle into updates
//! to the rainflow matrix, range-pair histogram, level-crossing
//! histogram, and cumulative pseudo-damage.
//!
//! Weight convention (resolved Open Question, see DESIGN.md): a
//! genuinely closed cycle (4PTM/HCM) and a `FULLCYCLES` residual pair
//! both contribute `matrix_inc = 1` with `damage_fraction = 1.0`; a
//! `HALFCYCLES` residual pair contributes `matrix_inc = 1` with
//! `damage_fraction = 0.5`. This matches SPEC_FULL §8's worked boundary
//! examples (e.g. `matrix[3,2] = 1` for a single 4PTM closure).

use tracing::error;

use crate::class::ClassParams;
use crate::cycle::ClosedCycle;
use crate::damage_history::{DamageHistory, SpreadMode};
use crate::error::{RainflowError, Result};
use crate::flags::Flags;
use crate::sample::TurningPoint;
use crate::wohler::WohlerParams;

/// Ceiling on any single histogram cell (SPEC_FULL §9: `COUNTS_LIMIT =
/// u64::MAX / 4`), checked on every increment so a saturating cell is
/// unambiguously a precondition violation rather than a realistic count.
pub const COUNTS_LIMIT: u64 = u64::MAX / 4;

/// The weight a single counted cycle contributes to the histograms and
/// to the damage sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleWeight {
    pub matrix_inc: u64,
    pub damage_fraction: f64,
}

impl CycleWeight {
    pub const FULL: CycleWeight = CycleWeight {
        matrix_inc: 1,
        damage_fraction: 1.0,
    };
    pub const HALF: CycleWeight = CycleWeight {
        matrix_inc: 1,
        damage_fraction: 0.5,
    };
}

/// Dense rainflow matrix plus the range-pair and level-crossing
/// histograms, all sized by `class_count`.
#[derive(Debug, Clone)]
pub struct Histograms {
    count: u32,
    matrix: Vec<u64>,
    rp: Vec<u64>,
    lc: Vec<u64>,
}

impl Histograms {
    pub fn new(count: u32) -> Self {
        let n = count as usize;
        Self {
            count,
            matrix: vec![0; n * n],
            rp: vec![0; n],
            lc: vec![0; n],
        }
    }

    #[inline]
    pub fn matrix(&self) -> &[u64] {
        &self.matrix
    }

    #[inline]
    pub fn matrix_at(&self, from: u32, to: u32) -> u64 {
        self.matrix[from as usize * self.count as usize + to as usize]
    }

    #[inline]
    pub fn range_pair(&self) -> &[u64] {
        &self.rp
    }

    #[inline]
    pub fn level_crossing(&self) -> &[u64] {
        &self.lc
    }

    #[inline]
    pub fn sum_matrix(&self) -> u64 {
        self.matrix.iter().sum()
    }

    pub fn reset(&mut self) {
        self.matrix.iter_mut().for_each(|c| *c = 0);
        self.rp.iter_mut().for_each(|c| *c = 0);
        self.lc.iter_mut().for_each(|c| *c = 0);
    }

    fn bump(cell: &mut u64, inc: u64) -> Result<()> {
        let next = *cell + inc;
        if next > COUNTS_LIMIT {
            error!(cell = *cell, inc, limit = COUNTS_LIMIT, "histogram cell overflow");
            return Err(RainflowError::InvalidState(format!(
                "histogram cell would exceed COUNTS_LIMIT ({COUNTS_LIMIT})"
            )));
        }
        *cell = next;
        Ok(())
    }
}

/// Process one closed cycle: update histograms per `flags`, accumulate
/// pseudo-damage, and optionally spread it across `damage_history`.
///
/// `next` is the turning point immediately following the closed pair in
/// the stream, if any — used only by the damage-history spread modes.
#[allow(clippy::too_many_arguments)]
pub fn process_cycle(
    classes: &ClassParams,
    wohler: &WohlerParams,
    flags: Flags,
    weight: CycleWeight,
    cycle: ClosedCycle,
    next: Option<TurningPoint>,
    hist: &mut Histograms,
    damage: &mut f64,
    spread_mode: SpreadMode,
    damage_history: Option<&mut DamageHistory>,
) -> Result<()> {
    let cf = cycle.from.class.min(classes.count() - 1);
    let ct = cycle.to.class.min(classes.count() - 1);
    if cf == ct {
        return Ok(());
    }

    let range = classes.width() * (ct as i64 - cf as i64).unsigned_abs() as f64;
    let sa = range / 2.0;
    let d = wohler.damage_for_amplitude(sa);
    let weighted_d = d * weight.damage_fraction;
    *damage += weighted_d;

    if flags.contains(Flags::COUNT_MATRIX) {
        let n = classes.count() as usize;
        Histograms::bump(&mut hist.matrix[cf as usize * n + ct as usize], weight.matrix_inc)?;
    }
    if flags.contains(Flags::COUNT_RP) {
        let idx = ct.abs_diff(cf) as usize;
        Histograms::bump(&mut hist.rp[idx], weight.matrix_inc)?;
    }
    if cf < ct && flags.contains(Flags::COUNT_LC_UP) {
        for i in cf..ct {
            Histograms::bump(&mut hist.lc[i as usize], weight.matrix_inc)?;
        }
    } else if cf > ct && flags.contains(Flags::COUNT_LC_DN) {
        for i in ct..cf {
            Histograms::bump(&mut hist.lc[i as usize], weight.matrix_inc)?;
        }
    }

    if let Some(history) = damage_history {
        history.distribute(spread_mode, cycle.from, next, weighted_d);
    }

    Ok(())
}

/// Like [`process_cycle`] but only updates range-pair and level-crossing
/// (never the matrix or damage sum) — used by the `RP_DIN45667`
/// finalizer (SPEC_FULL §4.7), which explicitly excludes matrix/damage.
pub fn process_rp_lc_only(
    classes: &ClassParams,
    flags: Flags,
    weight: CycleWeight,
    cycle: ClosedCycle,
    hist: &mut Histograms,
) -> Result<()> {
    let cf = cycle.from.class.min(classes.count() - 1);
    let ct = cycle.to.class.min(classes.count() - 1);
    if cf == ct {
        return Ok(());
    }
    if flags.contains(Flags::COUNT_RP) {
        let idx = ct.abs_diff(cf) as usize;
        Histograms::bump(&mut hist.rp[idx], weight.matrix_inc)?;
    }
    if cf < ct && flags.contains(Flags::COUNT_LC_UP) {
        for i in cf..ct {
            Histograms::bump(&mut hist.lc[i as usize], weight.matrix_inc)?;
        }
    } else if cf > ct && flags.contains(Flags::COUNT_LC_DN) {
        for i in ct..cf {
            Histograms::bump(&mut hist.lc[i as usize], weight.matrix_inc)?;
        }
    }
    Ok(())
}
