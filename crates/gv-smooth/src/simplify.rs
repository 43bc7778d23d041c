use gv_core::Point2;

use crate::ArcTransform;

/// Ramer-Douglas-Peucker polyline simplification.
///
/// With `tolerance` zero only exactly-collinear interior points are
/// removed. Closed arcs are cut at their midpoint index and the two halves
/// simplified independently, so a loop never degenerates to its chord and
/// the seed vertex stays pinned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rdp {
    pub tolerance: f64,
}

impl ArcTransform for Rdp {
    fn name(&self) -> &'static str {
        "rdp"
    }

    fn apply(&self, points: &[Point2], closed: bool) -> Vec<Point2> {
        if points.len() <= 2 {
            return points.to_vec();
        }

        if closed {
            let mid = points.len() / 2;
            let mut first = rdp_open(&points[..=mid], self.tolerance);
            let second = rdp_open(&points[mid..], self.tolerance);
            first.pop();
            first.extend(second);
            first
        } else {
            rdp_open(points, self.tolerance)
        }
    }
}

fn rdp_open(points: &[Point2], tolerance: f64) -> Vec<Point2> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((lo, hi)) = stack.pop() {
        if hi - lo < 2 {
            continue;
        }

        let mut far_i = lo;
        let mut far_d = 0.0f64;
        for i in lo + 1..hi {
            let d = chord_distance(points[i], points[lo], points[hi]);
            if d > far_d {
                far_d = d;
                far_i = i;
            }
        }

        if far_d > tolerance {
            keep[far_i] = true;
            stack.push((lo, far_i));
            stack.push((far_i, hi));
        }
    }

    points
        .iter()
        .zip(&keep)
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

/// Distance from `p` to the chord `a..b`; plain distance to `a` when the
/// chord is degenerate (a loop arc anchored at a single junction).
fn chord_distance(p: Point2, a: Point2, b: Point2) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        let (ex, ey) = (p.x - a.x, p.y - a.y);
        return (ex * ex + ey * ey).sqrt();
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len2.sqrt()
}

#[cfg(test)]
mod tests {
    use super::Rdp;
    use crate::ArcTransform;
    use gv_core::Point2;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn collinear_points_drop_at_zero_tolerance() {
        let rdp = Rdp { tolerance: 0.0 };
        let out = rdp.apply(&[p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0)], false);
        assert_eq!(out, vec![p(0.0, 0.0), p(3.0, 0.0)]);
    }

    #[test]
    fn corners_beyond_tolerance_survive() {
        let rdp = Rdp { tolerance: 0.5 };
        let out = rdp.apply(&[p(0.0, 0.0), p(2.0, 1.0), p(4.0, 0.0)], false);
        assert_eq!(out.len(), 3);

        let out = rdp.apply(&[p(0.0, 0.0), p(2.0, 0.4), p(4.0, 0.0)], false);
        assert_eq!(out, vec![p(0.0, 0.0), p(4.0, 0.0)]);
    }

    #[test]
    fn closed_ring_keeps_corners_not_just_chord() {
        // Full boundary of a 2x2 block, seed first.
        let ring = [
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(2.0, 2.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
            p(0.0, 1.0),
            p(0.0, 0.0),
        ];
        let rdp = Rdp { tolerance: 0.1 };
        let out = rdp.apply(&ring, true);

        assert_eq!(
            out,
            vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(0.0, 0.0)]
        );
    }

    #[test]
    fn loop_arc_with_degenerate_chord() {
        // Open arc whose endpoints coincide at a junction.
        let loop_arc = [
            p(1.0, 1.0),
            p(2.0, 1.0),
            p(2.0, 2.0),
            p(1.0, 2.0),
            p(1.0, 1.0),
        ];
        let rdp = Rdp { tolerance: 0.1 };
        let out = rdp.apply(&loop_arc, false);

        assert_eq!(out.first(), out.last());
        assert!(out.len() >= 3, "loop must not collapse to its endpoints");
    }
}
