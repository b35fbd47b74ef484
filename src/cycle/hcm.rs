//! Clormann-Seeger HCM stack method (SPEC_FULL §4.4).
//!
//! Maintains an auxiliary stack of turning points with a reserved floor
//! index `ir` below which points are never popped by the three-point
//! test, and a top index (the stack length, the reference's `IZ`).
//! Turning points are consumed from the residue front one at a time;
//! the stack itself becomes the residue at finalization.

use super::ClosedCycle;
use crate::sample::TurningPoint;

/// HCM auxiliary stack state, capacity `2 * class_count`.
#[derive(Debug, Clone)]
pub struct HcmStack {
    stack: Vec<TurningPoint>,
    /// Reserved floor index (the reference's 1-based `IR`); `0` means
    /// the stack has not yet been seeded.
    ir: usize,
}

impl HcmStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: Vec::with_capacity(capacity),
            ir: 0,
        }
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.ir = 0;
    }

    /// Current stack contents, oldest first — the HCM view of the
    /// residue.
    #[inline]
    pub fn as_slice(&self) -> &[TurningPoint] {
        &self.stack
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Feed one newly-confirmed turning point, invoking `on_cycle` for
    /// every closed loop found.
    pub fn process(&mut self, k: TurningPoint, mut on_cycle: impl FnMut(ClosedCycle)) {
        if self.ir == 0 {
            self.stack.push(k);
            self.ir = 1;
            return;
        }

        loop {
            let iz = self.stack.len();
            if iz > self.ir {
                let i = self.stack[iz - 2];
                let j = self.stack[iz - 1];
                if (k.value - j.value) * (j.value - i.value) >= 0.0 {
                    self.stack.pop();
                    continue;
                }
                if (k.value - j.value).abs() >= (j.value - i.value).abs() {
                    on_cycle(ClosedCycle { from: i, to: j });
                    self.stack.pop();
                    self.stack.pop();
                    continue;
                }
                break;
            } else if iz == self.ir {
                let j = self.stack[iz - 1];
                if (k.value - j.value) * j.value >= 0.0 {
                    // SPEC_FULL §4.4: pop only; the reserved floor `ir`
                    // is advanced solely in the `|K| > |J|` arm below, it
                    // is never retreated here.
                    self.stack.pop();
                } else if k.value.abs() > j.value.abs() {
                    self.ir += 1;
                }
                break;
            } else {
                break;
            }
        }

        self.stack.push(k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassParams;

    fn tp(classes: &ClassParams, v: f64, pos: u64) -> TurningPoint {
        TurningPoint::new(v, pos, classes.quantize(v))
    }

    #[test]
    fn first_point_seeds_the_floor() {
        let classes = ClassParams::new(0.5, 1.0, 8).unwrap();
        let mut s = HcmStack::new(16);
        let mut closed = Vec::new();
        s.process(tp(&classes, 1.0, 1), |c| closed.push(c));
        assert!(closed.is_empty());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn closes_a_simple_symmetric_cycle() {
        // Mean-centered data: -1 seeds the floor, 5 (|5|>|-1|) advances
        // it, -2 sits above the floor without exceeding it, then 6's
        // swing against -2 (8) exceeds -2's swing against 5 (7) and
        // closes the inner pair 5 -> -2.
        let classes = ClassParams::new(0.5, 1.0, 8).unwrap();
        let mut s = HcmStack::new(16);
        let mut closed = Vec::new();
        for v in [-1.0, 5.0, -2.0, 6.0] {
            s.process(tp(&classes, v, 1), |c| closed.push(c));
        }
        assert_eq!(closed.len(), 1);
        assert_eq!((closed[0].from.value, closed[0].to.value), (5.0, -2.0));
    }

    #[test]
    fn reset_clears_stack_and_floor() {
        let classes = ClassParams::new(0.5, 1.0, 8).unwrap();
        let mut s = HcmStack::new(16);
        s.process(tp(&classes, 1.0, 1), |_| {});
        s.process(tp(&classes, 5.0, 2), |_| {});
        s.reset();
        assert!(s.is_empty());
    }
}
