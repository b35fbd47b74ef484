//! Streaming rainflow fatigue cycle-counting engine.
//!
//! [`RainflowEngine`] consumes a stream of scalar samples of unbounded
//! length in bounded memory (proportional to the configured class count)
//! and maintains, incrementally, a rainflow matrix, range-pair and
//! level-crossing histograms, and a cumulative Wöhler pseudo-damage sum.
//! Two interchangeable cycle-extraction algorithms are available (the
//! four-point method and the Clormann-Seeger HCM stack method); either
//! can be paired with any of several residue-finalization policies once
//! the stream ends.
//!
//! Samples may be fed in arbitrarily small chunks — [`RainflowEngine`]'s
//! results are identical regardless of how the same logical stream is
//! split across [`RainflowEngine::feed`] calls.

pub mod class;
pub mod cycle;
pub mod damage_history;
pub mod detector;
pub mod error;
pub mod finalize;
pub mod flags;
pub mod processor;
pub mod residue;
pub mod sample;
pub mod tp_store;
pub mod wohler;

pub use class::ClassParams;
pub use cycle::{ClosedCycle, CyclePolicy};
pub use damage_history::{DamageHistory, SpreadMode};
pub use error::{RainflowError, Result};
pub use finalize::ResiduePolicy;
pub use flags::Flags;
pub use processor::{CycleWeight, Histograms, COUNTS_LIMIT};
pub use sample::{Sample, TurningPoint};
pub use tp_store::TpStore;
pub use wohler::WohlerParams;

use cycle::{four_point, hcm::HcmStack};
use detector::TurningPointDetector;
use finalize::{adjacent_pairs, clormann_seeger_sweep, din45667_sweep};
use processor::{process_cycle, process_rp_lc_only};

/// Lifecycle state of a [`RainflowEngine`].
///
/// SPEC_FULL's pre-construction `INIT0` state has no counterpart here:
/// a `RainflowEngine` is only ever observed after a successful
/// [`RainflowEngine::new`], which is SPEC_FULL's `init()` — so
/// construction always lands directly in `Init`. Otherwise monotonic
/// except for [`RainflowEngine::reset`], which returns to `Init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed; no sample fed yet.
    Init,
    /// At least one sample fed; still searching for the first turning
    /// point.
    Busy,
    /// At least one turning point confirmed; tracking an interim tail.
    BusyInterim,
    /// `finalize` is in progress (never observed by callers; exists to
    /// make the lifecycle explicit internally).
    Finalize,
    /// `finalize` has completed; `feed` is no longer accepted.
    Finished,
    /// A fatal error occurred; the engine is unusable until [`RainflowEngine::reset`].
    Error,
}

/// Dispatches a confirmed turning point to whichever cycle-extraction
/// algorithm is configured, and owns that algorithm's residue
/// representation.
///
/// Grounded on `evo_control_unit`'s filter-state pattern: a plain enum
/// over the backing state, mutated through free functions
/// ([`four_point::reduce`], [`HcmStack::process`]) rather than trait
/// objects — there are only three variants and no caller needs to
/// extend the set.
#[derive(Debug, Clone)]
enum Finder {
    FourPoint(Vec<TurningPoint>),
    Hcm(HcmStack),
    None(Vec<TurningPoint>),
}

impl Finder {
    fn new(policy: CyclePolicy, capacity: usize) -> Self {
        match policy {
            CyclePolicy::FourPoint => Finder::FourPoint(Vec::with_capacity(capacity)),
            CyclePolicy::Hcm => Finder::Hcm(HcmStack::new(capacity)),
            CyclePolicy::None => Finder::None(Vec::with_capacity(capacity)),
        }
    }

    fn residue(&self) -> &[TurningPoint] {
        match self {
            Finder::FourPoint(v) | Finder::None(v) => v,
            Finder::Hcm(s) => s.as_slice(),
        }
    }

    fn reset(&mut self) {
        match self {
            Finder::FourPoint(v) | Finder::None(v) => v.clear(),
            Finder::Hcm(s) => s.reset(),
        }
    }

    /// Append a newly-confirmed turning point, returning every cycle it
    /// closes paired with a "next" hint for damage-history spreading.
    ///
    /// The hint is the residue's new tail once this append (and any
    /// cascading closures it triggers) settles — an approximation of
    /// "the point after D" for cycles closed mid-cascade, since a true
    /// successor may not exist yet at the moment of closure. Documented
    /// as a simplification in DESIGN.md; it affects only spread shape,
    /// never the matrix or damage totals.
    fn append(&mut self, tp: TurningPoint) -> Vec<(ClosedCycle, Option<TurningPoint>)> {
        let mut closed = Vec::new();
        match self {
            Finder::FourPoint(residue) => {
                residue.push(tp);
                four_point::reduce(residue, |c| closed.push(c));
                let next = residue.last().copied();
                closed.into_iter().map(|c| (c, next)).collect()
            }
            Finder::Hcm(stack) => {
                stack.process(tp, |c| closed.push(c));
                let next = stack.as_slice().last().copied();
                closed.into_iter().map(|c| (c, next)).collect()
            }
            Finder::None(residue) => {
                residue.push(tp);
                Vec::new()
            }
        }
    }
}

/// Streaming rainflow cycle-counting context.
///
/// `Send` (may be built on one thread and handed to another) but
/// deliberately not `Sync`: every method takes `&mut self`, and the
/// engine has no interior mutability — one context belongs to one
/// caller at a time, matching SPEC_FULL §2's "caller-owned context
/// object, no implicit concurrency".
pub struct RainflowEngine {
    classes: ClassParams,
    wohler: WohlerParams,
    flags: Flags,
    spread_mode: SpreadMode,
    state: EngineState,
    detector: TurningPointDetector,
    finder: Finder,
    hist: Histograms,
    damage: f64,
    damage_history: Option<DamageHistory>,
    tp_store: Option<TpStore>,
    first_sample: Option<Sample>,
    last_sample: Option<Sample>,
    sample_count: u64,
}

impl RainflowEngine {
    /// Build a new engine: `classes` fixes the discretization and
    /// histogram sizes, `hysteresis` gates turning-point confirmation
    /// (SPEC_FULL §4.2), and `wohler` supplies the S-N curve used for
    /// pseudo-damage. Defaults to the four-point method, `Flags::COUNT_ALL`,
    /// `SpreadMode::Half23`, no damage-history buffer, no turning-point
    /// store — use the `with_*` builders to change any of these before
    /// the first [`RainflowEngine::feed`].
    pub fn new(classes: ClassParams, hysteresis: f64, wohler: WohlerParams) -> Result<Self> {
        if !(hysteresis >= 0.0) {
            return Err(RainflowError::InvalidArgument(format!(
                "hysteresis must be >= 0, got {hysteresis}"
            )));
        }
        let cap = residue::capacity_hint(classes.count());
        let count = classes.count();
        Ok(Self {
            detector: TurningPointDetector::new(hysteresis),
            finder: Finder::new(CyclePolicy::default(), cap),
            hist: Histograms::new(count),
            damage: 0.0,
            damage_history: None,
            tp_store: None,
            flags: Flags::default(),
            spread_mode: SpreadMode::default(),
            classes,
            wohler,
            first_sample: None,
            last_sample: None,
            sample_count: 0,
            state: EngineState::Init,
        })
    }

    /// Select the cycle-extraction algorithm. Only meaningful before the
    /// first sample is fed; calling it afterward discards any
    /// in-progress residue.
    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        let cap = residue::capacity_hint(self.classes.count());
        self.finder = Finder::new(policy, cap);
        self
    }

    /// Select which outputs are accumulated.
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Select the damage-history spread mode.
    pub fn with_spread_mode(mut self, mode: SpreadMode) -> Self {
        self.spread_mode = mode;
        self
    }

    /// Enable the per-sample-position damage-history buffer.
    pub fn with_damage_history(mut self) -> Self {
        self.damage_history = Some(DamageHistory::new());
        self
    }

    /// Enable the turning-point log.
    pub fn with_tp_store(mut self) -> Self {
        self.tp_store = Some(TpStore::new());
        self
    }

    /// Feed raw values; each is assigned the next 1-based stream
    /// position automatically.
    pub fn feed(&mut self, values: &[f64]) -> Result<()> {
        for &v in values {
            let position = self.sample_count + 1;
            self.feed_one(Sample::new(v, position))?;
        }
        Ok(())
    }

    /// Feed pre-positioned samples, e.g. when reassembling a stream that
    /// was itself split and fed out of a different buffer.
    pub fn feed_tuple(&mut self, samples: &[Sample]) -> Result<()> {
        for &s in samples {
            self.feed_one(s)?;
        }
        Ok(())
    }

    fn feed_one(&mut self, sample: Sample) -> Result<()> {
        if matches!(
            self.state,
            EngineState::Finalize | EngineState::Finished | EngineState::Error
        ) {
            return Err(RainflowError::InvalidState(
                "feed is not valid after finalize".into(),
            ));
        }
        self.sample_count += 1;
        if self.first_sample.is_none() {
            self.first_sample = Some(sample);
        }
        self.last_sample = Some(sample);

        match self.detector.process(&self.classes, sample) {
            Some(tp) => {
                self.state = EngineState::BusyInterim;
                self.commit_tp(tp)?;
            }
            None if self.state == EngineState::Init => {
                self.state = EngineState::Busy;
            }
            None => {}
        }
        Ok(())
    }

    /// Record a confirmed turning point: append to the log (if active),
    /// run it through the cycle finder, and process every cycle closed.
    fn commit_tp(&mut self, tp: TurningPoint) -> Result<()> {
        if let Some(store) = self.tp_store.as_mut() {
            store.append(tp);
        }
        for (cycle, next) in self.finder.append(tp) {
            self.apply_cycle(cycle, next, CycleWeight::FULL)?;
        }
        Ok(())
    }

    fn apply_cycle(
        &mut self,
        cycle: ClosedCycle,
        next: Option<TurningPoint>,
        weight: CycleWeight,
    ) -> Result<()> {
        process_cycle(
            &self.classes,
            &self.wohler,
            self.flags,
            weight,
            cycle,
            next,
            &mut self.hist,
            &mut self.damage,
            self.spread_mode,
            self.damage_history.as_mut(),
        )
        .inspect_err(|_| self.state = EngineState::Error)
    }

    /// End the stream: promote the pending interim (if any) into the
    /// residue, apply margin enforcement to the turning-point log (if
    /// active), then resolve whatever remains in the residue per
    /// `policy`.
    pub fn finalize(&mut self, policy: ResiduePolicy) -> Result<()> {
        if matches!(self.state, EngineState::Finished | EngineState::Error) {
            return Err(RainflowError::InvalidState(
                "finalize called more than once".into(),
            ));
        }
        self.state = EngineState::Finalize;

        // Promotion is a normal append: it runs through the same cycle
        // finder as a live feed-time confirmation.
        if let Some(interim) = self.detector.interim() {
            let class = self.classes.quantize(interim.value);
            let tp = TurningPoint::new(interim.value, interim.position, class);
            self.commit_tp(tp)?;
        }

        self.finalize_margin();

        match policy {
            ResiduePolicy::None | ResiduePolicy::Ignore => {}
            ResiduePolicy::Discard => {
                self.finder.reset();
            }
            ResiduePolicy::HalfCycles => {
                let residue = self.finder.residue().to_vec();
                for pair in adjacent_pairs(&residue, true) {
                    self.apply_cycle(pair.cycle, None, CycleWeight::HALF)?;
                }
                self.finder.reset();
            }
            ResiduePolicy::FullCycles => {
                let residue = self.finder.residue().to_vec();
                for pair in adjacent_pairs(&residue, false) {
                    self.apply_cycle(pair.cycle, None, CycleWeight::FULL)?;
                }
                self.finder.reset();
            }
            ResiduePolicy::ClormannSeeger => {
                let mut residue = self.finder.residue().to_vec();
                let mut closed = Vec::new();
                clormann_seeger_sweep(&mut residue, |c| closed.push(c));
                for cycle in closed {
                    self.apply_cycle(cycle, None, CycleWeight::FULL)?;
                }
                for pair in adjacent_pairs(&residue, true) {
                    self.apply_cycle(pair.cycle, None, CycleWeight::HALF)?;
                }
                self.finder.reset();
            }
            ResiduePolicy::RpDin45667 => {
                let residue = self.finder.residue().to_vec();
                for pair in din45667_sweep(&residue) {
                    process_rp_lc_only(
                        &self.classes,
                        self.flags,
                        CycleWeight::FULL,
                        pair.cycle,
                        &mut self.hist,
                    )
                    .inspect_err(|_| self.state = EngineState::Error)?;
                }
                self.finder.reset();
            }
            ResiduePolicy::Repeated => {
                // Classic "repeat the residue" technique: concatenate the
                // residue with itself before re-feeding, so the junction
                // between the two copies can expose cycles the original
                // pass, ending mid-stream, could not.
                let values: Vec<f64> = self.finder.residue().iter().map(|tp| tp.value).collect();
                self.finder.reset();
                self.detector.reset();
                self.state = EngineState::Busy;
                for &v in values.iter().chain(values.iter()) {
                    let position = self.sample_count + 1;
                    self.feed_one(Sample::new(v, position))?;
                }
                return self.finalize(ResiduePolicy::Ignore);
            }
        }

        if let Some(store) = self.tp_store.as_mut() {
            store.lock();
        }
        self.state = EngineState::Finished;
        Ok(())
    }

    /// Margin enforcement (SPEC_FULL §4.6, §4.9): only has an effect
    /// when `Flags::ENFORCE_MARGIN` is set and a turning-point store is
    /// active. Forces the very first fed sample to appear at the front
    /// of the log, and lets the very last fed sample override the log's
    /// tail entry when their values coincide and the tail isn't already
    /// at position 1.
    fn finalize_margin(&mut self) {
        if !self.flags.contains(Flags::ENFORCE_MARGIN) {
            return;
        }
        let (Some(first), Some(last)) = (self.first_sample, self.last_sample) else {
            return;
        };
        let Some(store) = self.tp_store.as_mut() else {
            return;
        };

        let right_margin = TurningPoint::new(last.value, last.position, self.classes.quantize(last.value));
        match store.pop() {
            Some(prev_tail) => {
                if right_margin.value == prev_tail.value && right_margin.position > 1 {
                    store.append(right_margin);
                } else {
                    store.append(prev_tail);
                    store.append(right_margin);
                }
            }
            None => store.append(right_margin),
        }

        if store.as_slice().first().map(|tp| tp.position) != Some(1) {
            let forced = TurningPoint::new(first.value, 1, self.classes.quantize(first.value));
            let rest: Vec<TurningPoint> = store.as_slice().to_vec();
            store.reset();
            store.append(forced);
            for tp in rest {
                store.append(tp);
            }
        }

        // The forced endpoints exist for the log only (SPEC_FULL §4.6);
        // they are not independent unclosed-cycle boundaries. When the
        // entire counting residue is nothing but the first and last raw
        // samples — the degenerate flat/stepped series margin enforcement
        // exists to annotate — it's now fully represented in the log, so
        // drop it rather than leave it stranded as a fictitious residual.
        let residue = self.finder.residue();
        if residue.len() == 2 && residue[0].value == first.value && residue[1].value == last.value
        {
            self.finder.reset();
        }
    }

    /// Discard all accumulated state and return to [`EngineState::Init`].
    /// Class parameters, Wöhler parameters, flags, and the cycle policy
    /// are retained.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.finder.reset();
        self.hist.reset();
        self.damage = 0.0;
        if let Some(h) = self.damage_history.as_mut() {
            h.reset();
        }
        if let Some(s) = self.tp_store.as_mut() {
            s.reset();
        }
        self.first_sample = None;
        self.last_sample = None;
        self.sample_count = 0;
        self.state = EngineState::Init;
    }

    /// Consume the engine. Provided for symmetry with the reference
    /// lifecycle's explicit `close()`; ordinary drop does the same.
    pub fn close(self) {}

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn classes(&self) -> &ClassParams {
        &self.classes
    }

    #[inline]
    pub fn wohler(&self) -> &WohlerParams {
        &self.wohler
    }

    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Cumulative pseudo-damage summed over every processed cycle so far.
    #[inline]
    pub fn pseudo_damage(&self) -> f64 {
        self.damage
    }

    /// The current residue: confirmed turning points not yet consumed by
    /// a closed cycle.
    #[inline]
    pub fn residue(&self) -> &[TurningPoint] {
        self.finder.residue()
    }

    #[inline]
    pub fn matrix(&self) -> &[u64] {
        self.hist.matrix()
    }

    #[inline]
    pub fn matrix_at(&self, from: u32, to: u32) -> u64 {
        self.hist.matrix_at(from, to)
    }

    #[inline]
    pub fn range_pair(&self) -> &[u64] {
        self.hist.range_pair()
    }

    #[inline]
    pub fn level_crossing(&self) -> &[u64] {
        self.hist.level_crossing()
    }

    /// The turning-point log, if [`RainflowEngine::with_tp_store`] was
    /// requested at construction.
    #[inline]
    pub fn tp_log(&self) -> Option<&[TurningPoint]> {
        self.tp_store.as_ref().map(|s| s.as_slice())
    }

    /// The per-sample-position damage-history buffer, if
    /// [`RainflowEngine::with_damage_history`] was requested.
    #[inline]
    pub fn damage_history(&self) -> Option<&[f64]> {
        self.damage_history.as_ref().map(|h| h.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(hysteresis: f64) -> RainflowEngine {
        let classes = ClassParams::new(0.5, 1.0, 8).unwrap();
        let wohler = WohlerParams::elementary(100.0, 1e6, -5.0, 0.0).unwrap();
        RainflowEngine::new(classes, hysteresis, wohler).unwrap()
    }

    #[test]
    fn empty_stream_has_no_cycles_and_zero_damage() {
        let mut e = engine(1.0);
        e.finalize(ResiduePolicy::None).unwrap();
        assert_eq!(e.state(), EngineState::Finished);
        assert_eq!(e.matrix().iter().sum::<u64>(), 0);
        assert_eq!(e.pseudo_damage(), 0.0);
        assert!(e.residue().is_empty());
    }

    #[test]
    fn one_cycle_up_closes_only_once_the_trailing_point_is_promoted() {
        // 1, 3, 2, 4: only 1, 3, 2 confirm live; 4 stays the pending
        // interim, so the 3->2 closure doesn't happen until finalize
        // promotes it into the residue.
        let mut e = engine(1.0);
        e.feed(&[1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_eq!(e.matrix().iter().sum::<u64>(), 0);
        e.finalize(ResiduePolicy::None).unwrap();
        assert_eq!(e.matrix().iter().sum::<u64>(), 1);
        let values: Vec<f64> = e.residue().iter().map(|t| t.value).collect();
        assert_eq!(values, vec![1.0, 4.0]);
    }

    #[test]
    fn one_cycle_down_mirrors_the_up_case() {
        let mut e = engine(1.0);
        e.feed(&[4.0, 2.0, 3.0, 1.0]).unwrap();
        e.finalize(ResiduePolicy::None).unwrap();
        assert_eq!(e.matrix().iter().sum::<u64>(), 1);
        let values: Vec<f64> = e.residue().iter().map(|t| t.value).collect();
        assert_eq!(values, vec![4.0, 1.0]);
    }

    #[test]
    fn chunking_does_not_change_the_result() {
        let seq = [2.0, 7.0, 1.0, 6.0, 2.0, 6.0, 1.0, 5.0, 3.0];
        let mut whole = engine(1.0);
        whole.feed(&seq).unwrap();
        whole.finalize(ResiduePolicy::None).unwrap();

        let mut chunked = engine(1.0);
        for chunk in seq.chunks(2) {
            chunked.feed(chunk).unwrap();
        }
        chunked.finalize(ResiduePolicy::None).unwrap();

        assert_eq!(whole.matrix(), chunked.matrix());
        assert_eq!(whole.pseudo_damage(), chunked.pseudo_damage());
        let a: Vec<f64> = whole.residue().iter().map(|t| t.value).collect();
        let b: Vec<f64> = chunked.residue().iter().map(|t| t.value).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn full_cycles_finalizer_closes_every_adjacent_residue_pair() {
        let mut e = engine(1.0);
        // A sequence whose residue never closes under 4PTM on its own.
        e.feed(&[1.0, 6.0, 2.0, 5.0]).unwrap();
        assert_eq!(e.residue().len(), 3, "interim not yet promoted");
        e.finalize(ResiduePolicy::FullCycles).unwrap();
        assert!(e.residue().is_empty());
        assert!(e.pseudo_damage() > 0.0);
    }

    #[test]
    fn feed_after_finalize_is_rejected() {
        let mut e = engine(1.0);
        e.feed(&[1.0, 2.0]).unwrap();
        e.finalize(ResiduePolicy::None).unwrap();
        assert!(e.feed(&[3.0]).is_err());
        assert_eq!(e.state(), EngineState::Finished);
    }

    #[test]
    fn reset_returns_to_init_and_clears_accumulators() {
        let mut e = engine(1.0);
        e.feed(&[1.0, 3.0, 2.0, 4.0]).unwrap();
        e.finalize(ResiduePolicy::FullCycles).unwrap();
        assert!(e.pseudo_damage() > 0.0);
        e.reset();
        assert_eq!(e.state(), EngineState::Init);
        assert_eq!(e.pseudo_damage(), 0.0);
        assert!(e.residue().is_empty());
        assert_eq!(e.matrix().iter().sum::<u64>(), 0);
    }

    #[test]
    fn hcm_policy_closes_the_same_cycle_as_four_point_on_a_simple_case() {
        let mut e = engine(1.0).with_cycle_policy(CyclePolicy::Hcm);
        e.feed(&[1.0, 3.0, 2.0, 4.0]).unwrap();
        e.finalize(ResiduePolicy::None).unwrap();
        assert_eq!(e.matrix().iter().sum::<u64>(), 1);
    }

    #[test]
    fn margin_enforcement_forces_first_and_last_sample_into_the_log() {
        let mut e = engine(1.0)
            .with_flags(Flags::COUNT_ALL | Flags::ENFORCE_MARGIN)
            .with_tp_store();
        e.feed(&[0.0, 0.0, 1.0, 1.0]).unwrap();
        e.finalize(ResiduePolicy::None).unwrap();
        let log = e.tp_log().unwrap();
        assert_eq!(log.first().map(|t| t.position), Some(1));
        assert_eq!(log.last().map(|t| t.position), Some(4));
        assert!(e.residue().is_empty());
    }

    #[test]
    fn repeated_policy_can_close_cycles_left_in_the_residue() {
        // [1, 6, 2, 5] never closes on its own (the outer range never
        // nests), but the junction formed by repeating it exposes two
        // more closures: 2->5 and 6->1.
        let mut e = engine(1.0);
        e.feed(&[1.0, 6.0, 2.0, 5.0]).unwrap();
        assert_eq!(e.matrix().iter().sum::<u64>(), 0, "no closure yet");
        e.finalize(ResiduePolicy::Repeated).unwrap();
        assert_eq!(e.matrix().iter().sum::<u64>(), 2);
        assert_eq!(e.state(), EngineState::Finished);
    }
}
