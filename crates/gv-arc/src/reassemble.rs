use core::fmt;

use gv_core::{Point2, Polygon, RegionPolygon, ring_contains, signed_area};
use log::warn;

use crate::decompose::Decomposition;
use crate::table::RingArcs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassembleError {
    /// A rebuilt ring has fewer than three distinct vertices; transforms
    /// collapsed it past the point of being a polygon boundary.
    DegenerateRing { label: i32 },
}

impl fmt::Display for ReassembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateRing { label } => {
                write!(f, "ring of label {label} collapsed to fewer than 3 distinct points")
            }
        }
    }
}

impl std::error::Error for ReassembleError {}

/// Rebuild every region's rings from the transformed arc table.
///
/// Consecutive arcs share their junction endpoint, which is emitted once.
/// Shells are re-oriented to positive signed area and holes to negative;
/// holes that ended up outside their shell are reparented to the smallest
/// enclosing shell of the same label, or demoted to a shell of their own
/// when none exists (logged, not fatal).
pub fn reassemble_polygons(
    regions: &[RegionPolygon],
    decomposition: &Decomposition,
) -> Result<Vec<(i32, Polygon)>, ReassembleError> {
    let mut polygons: Vec<(i32, Polygon)> = Vec::with_capacity(regions.len());

    for (region, rr) in regions.iter().zip(&decomposition.rings) {
        let mut shell = ring_points(decomposition, &rr.shell);
        check_ring(&shell, region.label)?;
        if signed_area(&shell) < 0.0 {
            shell.reverse();
        }

        let mut holes = Vec::with_capacity(rr.holes.len());
        for hr in &rr.holes {
            let mut hole = ring_points(decomposition, hr);
            check_ring(&hole, region.label)?;
            if signed_area(&hole) > 0.0 {
                hole.reverse();
            }
            holes.push(hole);
        }

        polygons.push((region.label, Polygon { shell, holes }));
    }

    renest_holes(&mut polygons);
    Ok(polygons)
}

fn ring_points(decomposition: &Decomposition, ring: &RingArcs) -> Vec<Point2> {
    let mut pts: Vec<Point2> = Vec::new();
    for (i, r) in ring.arcs.iter().enumerate() {
        let arc = decomposition.table.get(r.arc);
        let skip = usize::from(i > 0);
        if r.reversed {
            pts.extend(arc.points.iter().rev().skip(skip));
        } else {
            pts.extend(arc.points.iter().skip(skip));
        }
    }
    pts
}

fn check_ring(ring: &[Point2], label: i32) -> Result<(), ReassembleError> {
    let mut distinct = 0usize;
    for (i, p) in ring[..ring.len().saturating_sub(1)].iter().enumerate() {
        if !ring[..i].contains(p) {
            distinct += 1;
        }
        if distinct >= 3 {
            return Ok(());
        }
    }
    Err(ReassembleError::DegenerateRing { label })
}

/// Transform rounding can push a hole outside the shell that declared it.
/// Every hole is verified against its shell and repaired if needed.
fn renest_holes(polygons: &mut Vec<(i32, Polygon)>) {
    let mut demoted: Vec<(i32, Polygon)> = Vec::new();

    for i in 0..polygons.len() {
        let mut misplaced = Vec::new();
        {
            let (label, poly) = &mut polygons[i];
            let mut k = 0;
            while k < poly.holes.len() {
                let probe = edge_midpoint(&poly.holes[k]);
                if ring_contains(&poly.shell, probe) {
                    k += 1;
                } else {
                    warn!("hole of label {label} fell outside its shell; reparenting");
                    misplaced.push(poly.holes.remove(k));
                }
            }
        }

        for hole in misplaced {
            let label = polygons[i].0;
            let probe = edge_midpoint(&hole);

            let mut best: Option<(usize, f64)> = None;
            for (j, (other_label, other)) in polygons.iter().enumerate() {
                if *other_label != label || j == i {
                    continue;
                }
                if !ring_contains(&other.shell, probe) {
                    continue;
                }
                let area = signed_area(&other.shell);
                if best.is_none_or(|(_, a)| area < a) {
                    best = Some((j, area));
                }
            }

            match best {
                Some((j, _)) => polygons[j].1.holes.push(hole),
                None => {
                    warn!("hole of label {label} has no enclosing shell; demoting to shell");
                    let mut shell: Vec<Point2> = hole;
                    shell.reverse();
                    demoted.push((label, Polygon {
                        shell,
                        holes: Vec::new(),
                    }));
                }
            }
        }
    }

    polygons.extend(demoted);
}

/// Midpoint of the ring's first edge: lies on the hole boundary itself, so
/// it cannot coincide with a pinned junction vertex shared with the shell.
fn edge_midpoint(ring: &[Point2]) -> Point2 {
    let (a, b) = (ring[0], ring[1]);
    Point2::new(0.5 * (a.x + b.x), 0.5 * (a.y + b.y))
}
