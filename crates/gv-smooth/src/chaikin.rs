use gv_core::Point2;

use crate::ArcTransform;

/// Chaikin corner cutting, endpoint-preserving variant.
///
/// Each iteration replaces every interior corner with two points at the
/// 1/4 and 3/4 marks of its incident segments while the first and last
/// points stay fixed. The blend is evaluated in a fixed operand order, so
/// reversing the input yields the bitwise-reversed output; seam segments
/// smoothed from opposite tiles therefore still cancel exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chaikin {
    pub iterations: usize,
}

impl ArcTransform for Chaikin {
    fn name(&self) -> &'static str {
        "chaikin"
    }

    fn apply(&self, points: &[Point2], _closed: bool) -> Vec<Point2> {
        let mut pts = points.to_vec();
        for _ in 0..self.iterations {
            if pts.len() < 2 {
                break;
            }
            pts = cut_once(&pts);
        }
        pts
    }
}

fn cut_once(pts: &[Point2]) -> Vec<Point2> {
    let n = pts.len();
    let mut out = Vec::with_capacity(2 * n);

    out.push(pts[0]);
    for k in 1..n {
        out.push(blend(pts[k - 1], pts[k]));
        out.push(blend(pts[k], pts[k - 1]));
    }
    out.push(pts[n - 1]);
    out
}

/// `0.75 * a + 0.25 * b`, componentwise, in this exact order.
#[inline]
fn blend(a: Point2, b: Point2) -> Point2 {
    Point2::new(0.75 * a.x + 0.25 * b.x, 0.75 * a.y + 0.25 * b.y)
}

#[cfg(test)]
mod tests {
    use super::Chaikin;
    use crate::ArcTransform;
    use gv_core::{Point2, point_key};

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn one_iteration_cuts_the_corner() {
        let c = Chaikin { iterations: 1 };
        let out = c.apply(&[p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0)], false);

        assert_eq!(out.len(), 6);
        assert_eq!(out[0], p(0.0, 0.0));
        assert_eq!(out[5], p(2.0, 2.0));
        // Points flanking the old corner sit at the 3/4 marks.
        assert_eq!(out[2], p(1.5, 0.0));
        assert_eq!(out[3], p(2.0, 0.5));
    }

    #[test]
    fn zero_iterations_is_identity() {
        let c = Chaikin { iterations: 0 };
        let pts = vec![p(0.0, 0.0), p(1.0, 1.0), p(2.0, 0.0)];
        assert_eq!(c.apply(&pts, false), pts);
    }

    #[test]
    fn reversal_symmetry_is_bitwise() {
        let c = Chaikin { iterations: 3 };
        let pts = vec![
            p(0.1, 0.7),
            p(1.3, 0.7),
            p(1.3, 2.9),
            p(4.1, 2.9),
            p(4.1, 5.3),
        ];
        let rev: Vec<_> = pts.iter().rev().copied().collect();

        let fwd = c.apply(&pts, false);
        let bwd = c.apply(&rev, false);

        assert_eq!(fwd.len(), bwd.len());
        for (a, b) in fwd.iter().zip(bwd.iter().rev()) {
            assert_eq!(point_key(*a), point_key(*b));
        }
    }

    #[test]
    fn closed_arc_seed_stays_fixed() {
        let c = Chaikin { iterations: 4 };
        let ring = vec![
            p(1.0, 1.0),
            p(2.0, 1.0),
            p(2.0, 2.0),
            p(1.0, 2.0),
            p(1.0, 1.0),
        ];
        let out = c.apply(&ring, true);

        assert_eq!(out[0], p(1.0, 1.0));
        assert_eq!(*out.last().expect("nonempty"), p(1.0, 1.0));
    }
}
