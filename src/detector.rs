//! Turning-point detector (SPEC_FULL §4.2): a two-stage online state
//! machine — global-extrema search for the first turning point, then
//! hysteresis + peak-valley filtering for every point after.

use crate::class::ClassParams;
use crate::sample::{Sample, TurningPoint};

/// Detector lifecycle, nested inside [`crate::EngineState::Busy`] /
/// [`crate::EngineState::BusyInterim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// No sample seen yet.
    Init,
    /// Searching for the first turning point via global extrema.
    Busy,
    /// First turning point confirmed; tracking an interim tail.
    BusyInterim,
}

/// Online turning-point detector.
///
/// Consumes one sample at a time via [`TurningPointDetector::process`] and
/// returns at most one newly-confirmed turning point per call — the
/// *previous* interim, now confirmed.
#[derive(Debug, Clone)]
pub struct TurningPointDetector {
    hysteresis: f64,
    stage: Stage,
    /// Running minimum while searching for the first turning point.
    running_min: Sample,
    /// Running maximum while searching for the first turning point.
    running_max: Sample,
    /// Unconfirmed tail turning point.
    interim: Option<Sample>,
    /// Direction of travel from the last confirmed point to `interim`.
    /// `+1` rising, `-1` falling, `0` before the first point is confirmed.
    internal_slope: i8,
}

impl TurningPointDetector {
    /// Create a detector with the given hysteresis (minimum reversal
    /// magnitude required to confirm a turning point).
    pub fn new(hysteresis: f64) -> Self {
        Self {
            hysteresis,
            stage: Stage::Init,
            running_min: Sample::new(0.0, 0),
            running_max: Sample::new(0.0, 0),
            interim: None,
            internal_slope: 0,
        }
    }

    /// Reset to the pre-init stage, discarding all tracked extrema and the
    /// interim point. Does not change `hysteresis`.
    pub fn reset(&mut self) {
        self.stage = Stage::Init;
        self.running_min = Sample::new(0.0, 0);
        self.running_max = Sample::new(0.0, 0);
        self.interim = None;
        self.internal_slope = 0;
    }

    /// The current unconfirmed tail, if any.
    #[inline]
    pub fn interim(&self) -> Option<Sample> {
        self.interim
    }

    /// Feed one sample. Returns the newly-confirmed turning point, if any.
    pub fn process(&mut self, classes: &ClassParams, sample: Sample) -> Option<TurningPoint> {
        match self.stage {
            Stage::Init => {
                self.running_min = sample;
                self.running_max = sample;
                self.stage = Stage::Busy;
                None
            }
            Stage::Busy => self.process_busy(classes, sample),
            Stage::BusyInterim => self.process_busy_interim(classes, sample),
        }
    }

    fn process_busy(&mut self, classes: &ClassParams, sample: Sample) -> Option<TurningPoint> {
        let set_new_min = sample.value < self.running_min.value;
        if set_new_min {
            self.running_min = sample;
        } else if sample.value > self.running_max.value {
            self.running_max = sample;
        }

        let delta = (self.running_max.value - self.running_min.value).abs();
        if delta < self.hysteresis {
            return None;
        }

        // `is_falling_slope`: the current sample set the minimum, i.e. the
        // overall slope so far is downward, so the turning point just
        // confirmed is the running maximum that preceded the descent.
        let (tp_sample, slope) = if set_new_min {
            (self.running_max, -1i8)
        } else {
            (self.running_min, 1i8)
        };

        self.internal_slope = slope;
        self.interim = Some(sample);
        self.stage = Stage::BusyInterim;
        Some(to_turning_point(classes, tp_sample))
    }

    fn process_busy_interim(
        &mut self,
        classes: &ClassParams,
        sample: Sample,
    ) -> Option<TurningPoint> {
        let interim = self
            .interim
            .expect("interim must be set while in BusyInterim stage");
        let delta = sample.value - interim.value;
        let sign: i8 = if delta > 0.0 {
            1
        } else if delta < 0.0 {
            -1
        } else {
            0
        };

        if sign == self.internal_slope {
            // Continuation: the interim is justified but not confirmed.
            self.interim = Some(sample);
            return None;
        }

        if delta.abs() >= self.hysteresis {
            // Reversal beyond the hysteresis band: confirm the interim.
            let confirmed = to_turning_point(classes, interim);
            self.interim = Some(sample);
            self.internal_slope = -self.internal_slope;
            return Some(confirmed);
        }

        // Reversal within the hysteresis band: no-op.
        None
    }
}

fn to_turning_point(classes: &ClassParams, s: Sample) -> TurningPoint {
    TurningPoint::new(s.value, s.position, classes.quantize(s.value))
}
