use std::collections::{BTreeMap, HashMap};

use gv_core::{GridView, PixelPoint, Point2, Polygon, point_key, ring_contains, signed_area};
use log::{debug, warn};

use crate::error::PolygonizeError;
use crate::layout::TileDescriptor;
use crate::pipeline::{ClassPolygons, TileOutput, TileState};

type PKey = (u64, u64);

#[inline]
fn from_key(k: PKey) -> Point2 {
    Point2::new(f64::from_bits(k.0), f64::from_bits(k.1))
}

/// Per-side sets of seam vertices this tile expects to share with its
/// neighbor: lattice vertices whose seam segment has data pixels on both
/// sides. Both tiles compute a side's set from the same two pixel columns
/// (or rows), one seen directly and one through the halo, so adjacent
/// reports must be identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeamReport {
    pub west: Vec<PixelPoint>,
    pub east: Vec<PixelPoint>,
    pub north: Vec<PixelPoint>,
    pub south: Vec<PixelPoint>,
}

pub(crate) fn seam_reports(
    grid: &GridView<'_, i32>,
    nodata: Option<i32>,
    desc: &TileDescriptor,
) -> SeamReport {
    let data = |x: usize, y: usize| -> bool {
        grid.get(x, y).is_some_and(|v| nodata != Some(*v))
    };

    let vertical_seam = |x: usize| -> Vec<PixelPoint> {
        let mut set = std::collections::BTreeSet::new();
        for y in desc.window.y0..desc.window.y1 {
            if data(x - 1, y) && data(x, y) {
                set.insert(PixelPoint::new(x as i64, y as i64));
                set.insert(PixelPoint::new(x as i64, y as i64 + 1));
            }
        }
        set.into_iter().collect()
    };

    let horizontal_seam = |y: usize| -> Vec<PixelPoint> {
        let mut set = std::collections::BTreeSet::new();
        for x in desc.window.x0..desc.window.x1 {
            if data(x, y - 1) && data(x, y) {
                set.insert(PixelPoint::new(x as i64, y as i64));
                set.insert(PixelPoint::new(x as i64 + 1, y as i64));
            }
        }
        set.into_iter().collect()
    };

    SeamReport {
        west: if desc.halo.x0 < desc.window.x0 {
            vertical_seam(desc.window.x0)
        } else {
            Vec::new()
        },
        east: if desc.halo.x1 > desc.window.x1 {
            vertical_seam(desc.window.x1)
        } else {
            Vec::new()
        },
        north: if desc.halo.y0 < desc.window.y0 {
            horizontal_seam(desc.window.y0)
        } else {
            Vec::new()
        },
        south: if desc.halo.y1 > desc.window.y1 {
            horizontal_seam(desc.window.y1)
        } else {
            Vec::new()
        },
    }
}

/// Check that every pair of adjacent tiles reports the same seam vertex
/// set. A disagreement cannot come from the input; it flags a bug.
pub(crate) fn verify_seams(outputs: &[TileOutput]) -> Result<(), PolygonizeError> {
    let index: HashMap<(usize, usize), &TileOutput> =
        outputs.iter().map(|o| ((o.col, o.row), o)).collect();

    for o in outputs {
        if let Some(east) = index.get(&(o.col + 1, o.row)) {
            if o.seams.east != east.seams.west {
                return Err(PolygonizeError::SeamMismatch {
                    a: (o.col, o.row),
                    b: (east.col, east.row),
                });
            }
        }
        if let Some(south) = index.get(&(o.col, o.row + 1)) {
            if o.seams.south != south.seams.north {
                return Err(PolygonizeError::SeamMismatch {
                    a: (o.col, o.row),
                    b: (south.col, south.row),
                });
            }
        }
    }

    Ok(())
}

/// Union tile polygons per label by exact directed-segment cancellation.
///
/// Along a seam both tiles emit the same unit segments with opposite
/// directions and bitwise-equal coordinates, so matching pairs cancel and
/// the survivors stitch back into the merged rings with no new geometry.
pub(crate) fn union_by_label(outputs: Vec<TileOutput>) -> Vec<ClassPolygons> {
    let mut by_label: BTreeMap<i32, Vec<Polygon>> = BTreeMap::new();
    for mut output in outputs {
        output.state = TileState::Seamed;
        debug!("tile ({}, {}) -> {:?}", output.col, output.row, output.state);
        for (label, polygon) in output.polygons {
            by_label.entry(label).or_default().push(polygon);
        }
    }

    by_label
        .into_iter()
        .map(|(label, polygons)| ClassPolygons {
            label,
            polygons: union_class(label, polygons),
        })
        .collect()
}

fn union_class(label: i32, polygons: Vec<Polygon>) -> Vec<Polygon> {
    let mut counts: HashMap<(PKey, PKey), u32> = HashMap::new();
    for polygon in &polygons {
        for ring in std::iter::once(&polygon.shell).chain(polygon.holes.iter()) {
            for w in ring.windows(2) {
                *counts.entry((point_key(w[0]), point_key(w[1]))).or_insert(0) += 1;
            }
        }
    }

    // Directed segments that survive cancellation, as a sorted adjacency so
    // stitching is deterministic.
    let mut adj: BTreeMap<PKey, Vec<PKey>> = BTreeMap::new();
    let mut remaining = 0usize;
    for (&(a, b), &n) in &counts {
        let rev = counts.get(&(b, a)).copied().unwrap_or(0);
        if n > rev {
            for _ in 0..(n - rev) {
                adj.entry(a).or_default().push(b);
                remaining += 1;
            }
        }
    }
    for nexts in adj.values_mut() {
        nexts.sort_unstable();
    }

    let rings = stitch_rings(&mut adj, remaining);

    let mut out: Vec<Polygon> = Vec::new();
    let mut shell_areas: Vec<f64> = Vec::new();
    let mut holes: Vec<Vec<Point2>> = Vec::new();

    for ring in rings {
        let area = signed_area(&ring);
        if area >= 0.0 {
            out.push(Polygon {
                shell: ring,
                holes: Vec::new(),
            });
            shell_areas.push(area);
        } else {
            holes.push(ring);
        }
    }

    for hole in holes {
        let probe = Point2::new(
            0.5 * (hole[0].x + hole[1].x),
            0.5 * (hole[0].y + hole[1].y),
        );

        let mut best: Option<(usize, f64)> = None;
        for (i, polygon) in out.iter().enumerate() {
            if ring_contains(&polygon.shell, probe)
                && best.is_none_or(|(_, a)| shell_areas[i] < a)
            {
                best = Some((i, shell_areas[i]));
            }
        }

        match best {
            Some((i, _)) => out[i].holes.push(hole),
            None => {
                warn!("merged hole of label {label} has no enclosing shell; demoting");
                let mut shell = hole;
                shell.reverse();
                shell_areas.push(signed_area(&shell));
                out.push(Polygon {
                    shell,
                    holes: Vec::new(),
                });
            }
        }
    }

    out
}

fn stitch_rings(adj: &mut BTreeMap<PKey, Vec<PKey>>, mut remaining: usize) -> Vec<Vec<Point2>> {
    let mut rings = Vec::new();

    while remaining > 0 {
        let start = *adj
            .iter()
            .find(|(_, nexts)| !nexts.is_empty())
            .expect("directed segments remain")
            .0;

        let mut ring: Vec<Point2> = vec![from_key(start)];
        let mut cur = start;
        let mut incoming: Option<(f64, f64)> = None;

        loop {
            let cur_pt = from_key(cur);
            let nexts = adj.get_mut(&cur).expect("balanced segment graph");
            let idx = choose_next(cur_pt, incoming, nexts);
            let nk = nexts.remove(idx);
            remaining -= 1;

            let np = from_key(nk);
            incoming = Some((np.x - cur_pt.x, np.y - cur_pt.y));
            ring.push(np);
            cur = nk;

            if cur == start {
                break;
            }
        }

        rings.push(ring);
    }

    rings
}

/// Pick the next directed segment out of a vertex. Several candidates only
/// occur where same-label regions meet a pinned vertex diagonally; taking
/// the outgoing with the largest counterclockwise angle from the reversed
/// incoming direction keeps each face's boundary on its own ring.
fn choose_next(cur: Point2, incoming: Option<(f64, f64)>, nexts: &[PKey]) -> usize {
    if nexts.len() == 1 {
        return 0;
    }
    let Some((ix, iy)) = incoming else {
        return 0;
    };

    let (rx, ry) = (-ix, -iy);
    let mut best = 0usize;
    let mut best_angle = f64::NEG_INFINITY;

    for (i, &nk) in nexts.iter().enumerate() {
        let np = from_key(nk);
        let (dx, dy) = (np.x - cur.x, np.y - cur.y);

        let cross = rx * dy - ry * dx;
        let dot = rx * dx + ry * dy;
        let mut angle = cross.atan2(dot);
        if angle <= 0.0 {
            angle += std::f64::consts::TAU;
        }

        if angle > best_angle {
            best_angle = angle;
            best = i;
        }
    }

    best
}
