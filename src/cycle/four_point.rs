//! ASTM E1049 four-point method (SPEC_FULL §4.3).
//!
//! Given the last four points of the residue `A, B, C, D` (oldest to
//! newest), the inner range `[min(B,C), max(B,C)]` closes as a cycle
//! whenever it nests inside the outer range `[min(A,D), max(A,D)]`. A
//! closure removes `B` and `C` from the residue and the test repeats
//! against the new trailing four points, since removing a pair can
//! expose another closeable quartet further back.

use super::ClosedCycle;
use crate::sample::TurningPoint;

/// Run the four-point test against `residue` until no further quartet
/// closes, invoking `on_cycle` for each closed loop (oldest first).
///
/// Call this after every turning point is appended to `residue`
/// (including the interim promoted at finalization — promotion is a
/// normal append for this purpose).
pub fn reduce(residue: &mut Vec<TurningPoint>, mut on_cycle: impl FnMut(ClosedCycle)) {
    loop {
        let n = residue.len();
        if n < 4 {
            return;
        }
        let [a, b, c, d] = [residue[n - 4], residue[n - 3], residue[n - 2], residue[n - 1]];
        let (b_lo, b_hi) = (b.value.min(c.value), b.value.max(c.value));
        let (a_lo, a_hi) = (a.value.min(d.value), a.value.max(d.value));
        if a_lo <= b_lo && b_hi <= a_hi {
            on_cycle(ClosedCycle { from: b, to: c });
            // Remove B and C; D takes B's old slot, A stays put.
            residue.remove(n - 2);
            residue.remove(n - 3);
        } else {
            return;
        }
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
    fn closes_classic_one_cycle_up_example() {
        // 1, 3, 2, 4 (ASTM textbook example): closes 3->2, leaves [1, 4].
        let classes = ClassParams::new(0.5, 1.0, 4).unwrap();
        let mut residue = vec![
            tp(&classes, 1.0, 1),
            tp(&classes, 3.0, 2),
            tp(&classes, 2.0, 3),
            tp(&classes, 4.0, 4),
        ];
        let mut closed = Vec::new();
        reduce(&mut residue, |c| closed.push(c));
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].from.value, 3.0);
        assert_eq!(closed[0].to.value, 2.0);
        let values: Vec<f64> = residue.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![1.0, 4.0]);
    }

    #[test]
    fn closes_classic_one_cycle_down_example() {
        // 4, 2, 3, 1: closes 2->3, leaves [4, 1].
        let classes = ClassParams::new(0.5, 1.0, 4).unwrap();
        let mut residue = vec![
            tp(&classes, 4.0, 1),
            tp(&classes, 2.0, 2),
            tp(&classes, 3.0, 3),
            tp(&classes, 1.0, 4),
        ];
        let mut closed = Vec::new();
        reduce(&mut residue, |c| closed.push(c));
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].from.value, 2.0);
        assert_eq!(closed[0].to.value, 3.0);
        let values: Vec<f64> = residue.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![4.0, 1.0]);
    }

    #[test]
    fn no_closure_when_outer_range_does_not_nest() {
        let classes = ClassParams::new(0.5, 1.0, 8).unwrap();
        let mut residue = vec![
            tp(&classes, 1.0, 1),
            tp(&classes, 6.0, 2),
            tp(&classes, 2.0, 3),
            tp(&classes, 5.0, 4),
        ];
        let mut closed = Vec::new();
        reduce(&mut residue, |c| closed.push(c));
        assert!(closed.is_empty());
        assert_eq!(residue.len(), 4);
    }

    #[test]
    fn cascading_closure_examines_new_trailing_quartet() {
        // After closing one pair, the freed-up quartet further back may
        // also close.
        let classes = ClassParams::new(0.5, 1.0, 8).unwrap();
        let mut residue = vec![
            tp(&classes, 2.0, 1),
            tp(&classes, 6.0, 2),
            tp(&classes, 1.0, 3),
            tp(&classes, 6.0, 4),
            tp(&classes, 1.0, 5),
        ];
        let mut closed = Vec::new();
        reduce(&mut residue, |c| closed.push(c));
        assert_eq!(closed.len(), 1);
        assert_eq!((closed[0].from.value, closed[0].to.value), (1.0, 6.0));
        let values: Vec<f64> = residue.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![2.0, 6.0, 1.0]);
    }
}
