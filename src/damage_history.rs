//! Per-sample damage history (SPEC_FULL §3 "damage-history buffer", §4.5
//! "Damage history"): an optional growable buffer with one slot per fed
//! sample position, accumulating each closed cycle's damage contribution
//! spread across the samples it spans.
//!
//! Grows in fixed-size blocks as new positions are observed (SPEC_FULL §5:
//! "during damage-history growth (fixed-increment)") — unlike the
//! turning-point store, which grows geometrically.

use crate::sample::TurningPoint;

/// Growth increment in slots (SPEC_FULL §5: damage-history grows by a
/// fixed increment, not geometric doubling).
const GROWTH_BLOCK: usize = 4096;

/// How a closed cycle's damage contribution is spread across the sample
/// positions it spans (SPEC_FULL §4.5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpreadMode {
    /// Deposit the full contribution at `from.pos` only.
    #[default]
    Half23,
    /// Linearly ramp the contribution across `[from.pos, next.pos]`.
    RampAmplitude23,
    /// Deposit half at `from.pos`, half at `next.pos`.
    Transient23,
    /// As `Transient23`, but a cycle with no `next` deposits its single
    /// available half at `from.pos` only.
    Transient23c,
}

/// Per-sample-position damage accumulator.
#[derive(Debug, Clone, Default)]
pub struct DamageHistory {
    slots: Vec<f64>,
}

impl DamageHistory {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Ensure the buffer covers `position` (1-based), growing by fixed
    /// blocks of zero-filled slots as needed.
    fn ensure_capacity(&mut self, position: u64) {
        let needed = position as usize;
        if needed <= self.slots.len() {
            return;
        }
        let grown = needed.div_ceil(GROWTH_BLOCK) * GROWTH_BLOCK;
        self.slots.resize(grown, 0.0);
    }

    #[inline]
    fn deposit(&mut self, position: u64, amount: f64) {
        if position == 0 {
            return;
        }
        self.ensure_capacity(position);
        self.slots[position as usize - 1] += amount;
    }

    /// Spread a closed cycle's damage contribution `d` across
    /// `[from.pos, next.pos]` per `mode`. `next` is the point following
    /// the closed pair in the stream, if any (absent for a residue
    /// half-cycle with no follow-on sample).
    pub fn distribute(
        &mut self,
        mode: SpreadMode,
        from: TurningPoint,
        next: Option<TurningPoint>,
        d: f64,
    ) {
        if d == 0.0 {
            return;
        }
        match mode {
            SpreadMode::Half23 => self.deposit(from.position, d),
            SpreadMode::RampAmplitude23 => match next {
                None => self.deposit(from.position, d),
                Some(next) if next.position <= from.position => self.deposit(from.position, d),
                Some(next) => {
                    let span = next.position - from.position;
                    let weights: Vec<f64> = (0..=span)
                        .map(|i| {
                            let v = from.value + (next.value - from.value) * (i as f64 / span as f64);
                            v
                        })
                        .collect();
                    let total_abs: f64 = weights.iter().map(|w| w.abs()).sum();
                    if total_abs == 0.0 {
                        self.deposit(from.position, d);
                        return;
                    }
                    for (i, w) in weights.iter().enumerate() {
                        let frac = w.abs() / total_abs;
                        self.deposit(from.position + i as u64, d * frac);
                    }
                }
            },
            SpreadMode::Transient23 => match next {
                None => self.deposit(from.position, d),
                Some(next) => {
                    self.deposit(from.position, d / 2.0);
                    self.deposit(next.position, d / 2.0);
                }
            },
            SpreadMode::Transient23c => match next {
                // Only one half exists to deposit; the other is not
                // recovered by folding it onto `from.pos`.
                None => self.deposit(from.position, d / 2.0),
                Some(next) => {
                    self.deposit(from.position, d / 2.0);
                    self.deposit(next.position, d / 2.0);
                }
            },
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.slots
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.slots.iter().sum()
    }

    pub fn reset(&mut self) {
        self.slots.clear();
    }
}
