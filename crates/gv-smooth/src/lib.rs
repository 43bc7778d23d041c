//! Per-arc geometry transforms.
//!
//! Transforms receive one arc's point sequence at a time and must leave the
//! first and last points bitwise unchanged; for closed arcs that pins the
//! canonical seed vertex. Junctions between arcs therefore never move, which
//! is what keeps independently transformed neighbors gap-free.
//!
//! The driver applies a chain in order and validates after every transform:
//! at least two points, endpoints unchanged, no duplicate consecutive
//! points. A violation would silently corrupt reassembly, so it is fatal.

mod chaikin;
mod simplify;

use core::fmt;

use gv_arc::ArcTable;
use gv_core::{Point2, point_key};

pub use chaikin::Chaikin;
pub use simplify::Rdp;

/// One step of the per-arc transform chain.
pub trait ArcTransform: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce the transformed point sequence. `closed` is true when the
    /// arc is a seed-anchored loop with no junction.
    fn apply(&self, points: &[Point2], closed: bool) -> Vec<Point2>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    TooFewPoints { transform: &'static str },
    EndpointMoved { transform: &'static str },
    DuplicatePoint { transform: &'static str },
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints { transform } => {
                write!(f, "transform {transform} left an arc with fewer than 2 points")
            }
            Self::EndpointMoved { transform } => {
                write!(f, "transform {transform} moved a pinned arc endpoint")
            }
            Self::DuplicatePoint { transform } => {
                write!(f, "transform {transform} produced duplicate consecutive points")
            }
        }
    }
}

impl std::error::Error for TransformError {}

/// Default chain: simplify, then smooth.
pub fn default_chain(tolerance: f64, smoothing_iterations: usize) -> Vec<Box<dyn ArcTransform>> {
    vec![
        Box::new(Rdp { tolerance }),
        Box::new(Chaikin {
            iterations: smoothing_iterations,
        }),
    ]
}

/// Run the chain over every arc of the table, validating each step.
pub fn apply_chain(
    table: &mut ArcTable,
    chain: &[Box<dyn ArcTransform>],
) -> Result<(), TransformError> {
    for arc in &mut table.arcs {
        for t in chain {
            let out = t.apply(&arc.points, arc.closed);
            validate(&arc.points, &out, t.name())?;
            arc.points = out;
        }
    }
    Ok(())
}

fn validate(
    input: &[Point2],
    output: &[Point2],
    transform: &'static str,
) -> Result<(), TransformError> {
    if output.len() < 2 {
        return Err(TransformError::TooFewPoints { transform });
    }

    let first_pinned = point_key(output[0]) == point_key(input[0]);
    let last_pinned =
        point_key(output[output.len() - 1]) == point_key(input[input.len() - 1]);
    if !first_pinned || !last_pinned {
        return Err(TransformError::EndpointMoved { transform });
    }

    for w in output.windows(2) {
        if point_key(w[0]) == point_key(w[1]) {
            return Err(TransformError::DuplicatePoint { transform });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ArcTransform, TransformError, apply_chain, default_chain};
    use gv_arc::{TileFrame, decompose_rings};
    use gv_core::{Affine, Grid, PixelPoint, Point2, point_key};
    use gv_region::extract_region_polygons;

    fn table_for(w: usize, h: usize, data: Vec<i32>) -> gv_arc::ArcTable {
        let g = Grid::from_vec(w, h, data).expect("valid grid");
        let regions = extract_region_polygons(&g.as_view(), None, PixelPoint::new(0, 0));
        let mut d = decompose_rings(&regions, &TileFrame::interior());
        d.table.project(&Affine::unit());
        d.table
    }

    struct ShiftEndpoints;

    impl ArcTransform for ShiftEndpoints {
        fn name(&self) -> &'static str {
            "shift_endpoints"
        }

        fn apply(&self, points: &[Point2], _closed: bool) -> Vec<Point2> {
            points
                .iter()
                .map(|p| Point2::new(p.x + 0.5, p.y))
                .collect()
        }
    }

    struct Collapse;

    impl ArcTransform for Collapse {
        fn name(&self) -> &'static str {
            "collapse"
        }

        fn apply(&self, points: &[Point2], _closed: bool) -> Vec<Point2> {
            vec![points[0]]
        }
    }

    #[test]
    fn default_chain_keeps_endpoints_pinned() {
        let mut table = table_for(2, 2, vec![1, 2, 3, 3]);
        let before: Vec<(Point2, Point2)> = table
            .arcs
            .iter()
            .map(|a| (a.points[0], *a.points.last().expect("arc points")))
            .collect();

        apply_chain(&mut table, &default_chain(2.0, 3)).expect("chain applies");

        for (arc, (first, last)) in table.arcs.iter().zip(before) {
            assert_eq!(point_key(arc.points[0]), point_key(first));
            assert_eq!(
                point_key(*arc.points.last().expect("arc points")),
                point_key(last)
            );
        }
    }

    #[test]
    fn moved_endpoint_is_fatal() {
        let mut table = table_for(2, 1, vec![1, 1]);
        let chain: Vec<Box<dyn ArcTransform>> = vec![Box::new(ShiftEndpoints)];

        let err = apply_chain(&mut table, &chain).expect_err("pinning violated");
        assert_eq!(
            err,
            TransformError::EndpointMoved {
                transform: "shift_endpoints"
            }
        );
    }

    #[test]
    fn collapsed_arc_is_fatal() {
        let mut table = table_for(2, 1, vec![1, 1]);
        let chain: Vec<Box<dyn ArcTransform>> = vec![Box::new(Collapse)];

        let err = apply_chain(&mut table, &chain).expect_err("too few points");
        assert_eq!(
            err,
            TransformError::TooFewPoints {
                transform: "collapse"
            }
        );
    }
}
