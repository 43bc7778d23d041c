use std::collections::HashMap;

use gv_core::{PixelPoint, RegionPolygon};

use crate::table::{ArcId, ArcRef, ArcTable, BoundaryArc, RegionId, RegionRings, RingArcs, Side};

/// Seam lines of the tile, in global lattice coordinates.
///
/// A vertex on any seam line is a forced junction, so no arc ever crosses a
/// tile boundary; sides facing the raster exterior carry `None` and force
/// nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileFrame {
    pub west: Option<i64>,
    pub east: Option<i64>,
    pub north: Option<i64>,
    pub south: Option<i64>,
}

impl TileFrame {
    /// Frame of an untiled raster: no seams anywhere.
    pub fn interior() -> Self {
        Self::default()
    }

    #[inline]
    pub fn on_seam(&self, p: PixelPoint) -> bool {
        self.west == Some(p.x)
            || self.east == Some(p.x)
            || self.north == Some(p.y)
            || self.south == Some(p.y)
    }
}

/// Output of arc decomposition: the tile's arc table plus, per region, the
/// ring-arc indices that rebuild its rings.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub table: ArcTable,
    pub rings: Vec<RegionRings>,
}

impl Decomposition {
    /// Rebuild one ring's lattice point sequence from its arc refs.
    ///
    /// The result is the input ring up to rotation: walks start at the
    /// ring's first junction rather than its stored first vertex.
    pub fn lattice_ring(&self, ring: &RingArcs) -> Vec<PixelPoint> {
        let mut pts: Vec<PixelPoint> = Vec::new();
        for (i, r) in ring.arcs.iter().enumerate() {
            let arc = self.table.get(r.arc);
            let skip = usize::from(i > 0);
            if r.reversed {
                pts.extend(arc.lattice.iter().rev().skip(skip));
            } else {
                pts.extend(arc.lattice.iter().skip(skip));
            }
        }
        pts
    }
}

type SegKey = (PixelPoint, PixelPoint);

#[inline]
fn seg_key(a: PixelPoint, b: PixelPoint) -> SegKey {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, Copy)]
struct SegOwners {
    first: RegionId,
    second: Option<RegionId>,
}

#[derive(Debug, Clone, Copy, Default)]
struct VertexInfo {
    sides: [Option<Side>; 4],
    degree: u8,
}

impl VertexInfo {
    fn add_side(&mut self, side: Side) {
        for slot in &mut self.sides {
            match slot {
                Some(s) if *s == side => return,
                None => {
                    *slot = Some(side);
                    return;
                }
                _ => {}
            }
        }
        // A lattice vertex has at most four adjacent pixels, hence at most
        // four distinct sides.
        debug_assert!(false, "more than four sides at one vertex");
    }

    fn num_sides(&self) -> usize {
        self.sides.iter().filter(|s| s.is_some()).count()
    }
}

/// Decompose a tile's region rings into maximal shared arcs.
///
/// Every undirected ring segment lands in exactly one arc; traversing a
/// ring's arc refs in order (reversing where flagged) reproduces the ring.
pub fn decompose_rings(regions: &[RegionPolygon], frame: &TileFrame) -> Decomposition {
    let segs = collect_segment_owners(regions);
    let verts = collect_vertex_info(&segs);

    let is_junction = |p: PixelPoint| -> bool {
        if frame.on_seam(p) {
            return true;
        }
        let v = &verts[&p];
        v.num_sides() >= 3 || v.degree > 2
    };

    let mut b = Builder {
        segs: &segs,
        table: ArcTable::default(),
        seg_to_arc: HashMap::new(),
        closed_by_seed: HashMap::new(),
    };

    let mut rings = Vec::with_capacity(regions.len());
    for (r, region) in regions.iter().enumerate() {
        let shell = b.decompose_ring(&region.shell, r, &is_junction);
        let holes = region
            .holes
            .iter()
            .map(|h| b.decompose_ring(h, r, &is_junction))
            .collect();
        rings.push(RegionRings { shell, holes });
    }

    Decomposition {
        table: b.table,
        rings,
    }
}

fn collect_segment_owners(regions: &[RegionPolygon]) -> HashMap<SegKey, SegOwners> {
    let mut segs: HashMap<SegKey, SegOwners> = HashMap::new();

    for (r, region) in regions.iter().enumerate() {
        for ring in std::iter::once(&region.shell).chain(region.holes.iter()) {
            for w in ring.windows(2) {
                let key = seg_key(w[0], w[1]);
                segs.entry(key)
                    .and_modify(|o| {
                        debug_assert!(o.second.is_none(), "segment shared by three rings");
                        o.second = Some(r);
                    })
                    .or_insert(SegOwners {
                        first: r,
                        second: None,
                    });
            }
        }
    }

    segs
}

fn collect_vertex_info(segs: &HashMap<SegKey, SegOwners>) -> HashMap<PixelPoint, VertexInfo> {
    let mut verts: HashMap<PixelPoint, VertexInfo> = HashMap::new();

    for (key, owners) in segs {
        let a = Side::Region(owners.first);
        let b = owners.second.map(Side::Region).unwrap_or(Side::Outside);
        for p in [key.0, key.1] {
            let v = verts.entry(p).or_default();
            v.degree += 1;
            v.add_side(a);
            v.add_side(b);
        }
    }

    verts
}

struct Builder<'s> {
    segs: &'s HashMap<SegKey, SegOwners>,
    table: ArcTable,
    seg_to_arc: HashMap<SegKey, ArcId>,
    closed_by_seed: HashMap<PixelPoint, ArcId>,
}

impl Builder<'_> {
    /// The region on the far side of segment `(a, b)` from region `r`.
    fn other_side(&self, a: PixelPoint, b: PixelPoint, r: RegionId) -> Side {
        let owners = &self.segs[&seg_key(a, b)];
        if owners.first == r {
            owners.second.map(Side::Region).unwrap_or(Side::Outside)
        } else {
            debug_assert_eq!(owners.second, Some(r));
            Side::Region(owners.first)
        }
    }

    fn decompose_ring<F>(&mut self, ring: &[PixelPoint], r: RegionId, is_junction: &F) -> RingArcs
    where
        F: Fn(PixelPoint) -> bool,
    {
        debug_assert!(ring.len() >= 4 && ring.first() == ring.last());
        let n = ring.len() - 1;

        let junctions: Vec<usize> = (0..n).filter(|&i| is_junction(ring[i])).collect();
        if junctions.is_empty() {
            return RingArcs {
                arcs: vec![self.closed_arc(ring, n, r)],
            };
        }

        let mut arcs = Vec::with_capacity(junctions.len());
        for (k, &start) in junctions.iter().enumerate() {
            let end = junctions[(k + 1) % junctions.len()];

            let mut pts = vec![ring[start]];
            let mut i = start;
            loop {
                i = (i + 1) % n;
                pts.push(ring[i]);
                if i == end {
                    break;
                }
            }

            arcs.push(self.open_arc(pts, r));
        }

        RingArcs { arcs }
    }

    /// Junction-free ring: one closed arc, rotated so the lexicographically
    /// smallest vertex is the pinned seed. Two rings trace every closed arc
    /// (the enclosed shell and the enclosing hole); they agree on the seed,
    /// so the seed alone deduplicates.
    fn closed_arc(&mut self, ring: &[PixelPoint], n: usize, r: RegionId) -> ArcRef {
        let seed = (0..n)
            .min_by_key(|&i| ring[i])
            .expect("ring has at least one vertex");
        let rotated: Vec<PixelPoint> = (0..=n).map(|k| ring[(seed + k) % n]).collect();

        if let Some(&id) = self.closed_by_seed.get(&rotated[0]) {
            let reversed = self.table.get(id).lattice[1] != rotated[1];
            debug_assert!(reversed || self.table.get(id).lattice == rotated);
            return ArcRef { arc: id, reversed };
        }

        let other = self.other_side(rotated[0], rotated[1], r);
        let id = self.push_arc(rotated, Side::Region(r), other, true);
        self.closed_by_seed.insert(self.table.get(id).lattice[0], id);
        ArcRef {
            arc: id,
            reversed: false,
        }
    }

    /// Junction-to-junction arc. Each undirected segment belongs to exactly
    /// one arc, so the first segment identifies an already-built arc when
    /// the partner region walks the shared stretch.
    fn open_arc(&mut self, pts: Vec<PixelPoint>, r: RegionId) -> ArcRef {
        let key = seg_key(pts[0], pts[1]);
        if let Some(&id) = self.seg_to_arc.get(&key) {
            let arc = self.table.get(id);
            let reversed = !(arc.lattice[0] == pts[0] && arc.lattice[1] == pts[1]);
            debug_assert_eq!(arc.lattice.len(), pts.len());
            return ArcRef { arc: id, reversed };
        }

        let other = self.other_side(pts[0], pts[1], r);
        let id = self.push_arc(pts, Side::Region(r), other, false);
        ArcRef {
            arc: id,
            reversed: false,
        }
    }

    fn push_arc(&mut self, pts: Vec<PixelPoint>, left: Side, right: Side, closed: bool) -> ArcId {
        debug_assert_ne!(left, right, "arc sides must differ");
        let id = self.table.arcs.len();
        for w in pts.windows(2) {
            let prev = self.seg_to_arc.insert(seg_key(w[0], w[1]), id);
            debug_assert!(prev.is_none(), "segment assigned to two arcs");
        }
        self.table.arcs.push(BoundaryArc {
            id,
            lattice: pts,
            points: Vec::new(),
            left,
            right,
            closed,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::{TileFrame, decompose_rings};
    use crate::table::Side;
    use gv_core::{Grid, PixelPoint, RegionPolygon};
    use gv_region::extract_region_polygons;
    use std::collections::HashSet;

    fn pp(x: i64, y: i64) -> PixelPoint {
        PixelPoint::new(x, y)
    }

    fn regions_of(w: usize, h: usize, data: Vec<i32>) -> Vec<RegionPolygon> {
        let g = Grid::from_vec(w, h, data).expect("valid grid");
        extract_region_polygons(&g.as_view(), None, pp(0, 0))
    }

    fn is_rotation(a: &[PixelPoint], b: &[PixelPoint]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let (a, b) = (&a[..a.len() - 1], &b[..b.len() - 1]);
        (0..a.len()).any(|s| (0..a.len()).all(|i| a[(s + i) % a.len()] == b[i]))
    }

    #[test]
    fn three_label_junction() {
        let regions = regions_of(2, 2, vec![1, 2, 3, 3]);
        let d = decompose_rings(&regions, &TileFrame::interior());

        assert_eq!(d.table.len(), 6);

        let interior: Vec<_> = d
            .table
            .arcs
            .iter()
            .filter(|a| matches!((a.left, a.right), (Side::Region(_), Side::Region(_))))
            .collect();
        let exterior: Vec<_> = d
            .table
            .arcs
            .iter()
            .filter(|a| a.left == Side::Outside || a.right == Side::Outside)
            .collect();

        assert_eq!(interior.len(), 3);
        assert_eq!(exterior.len(), 3);

        // The three interior arcs are single segments meeting at (1, 1).
        for a in &interior {
            assert_eq!(a.lattice.len(), 2);
            assert!(a.lattice.contains(&pp(1, 1)));
            assert!(!a.closed);
        }
    }

    #[test]
    fn rings_reconstruct_exactly() {
        #[rustfmt::skip]
        let data = vec![
            1, 1, 2, 2,
            1, 3, 3, 2,
            1, 1, 2, 2,
        ];
        let regions = regions_of(4, 3, data);
        let d = decompose_rings(&regions, &TileFrame::interior());

        for (region, rr) in regions.iter().zip(&d.rings) {
            let shell = d.lattice_ring(&rr.shell);
            assert!(
                is_rotation(&shell, &region.shell),
                "shell mismatch for label {}",
                region.label
            );
            for (hole, hr) in region.holes.iter().zip(&rr.holes) {
                assert!(is_rotation(&d.lattice_ring(hr), hole));
            }
        }
    }

    #[test]
    fn every_segment_in_exactly_one_arc() {
        let regions = regions_of(2, 2, vec![1, 2, 2, 1]);
        let d = decompose_rings(&regions, &TileFrame::interior());

        // Checkerboard: four spoke arcs meeting at the center junction plus
        // four exterior arcs.
        assert_eq!(d.table.len(), 8);

        let mut arc_segs = HashSet::new();
        for arc in &d.table.arcs {
            for w in arc.lattice.windows(2) {
                let key = super::seg_key(w[0], w[1]);
                assert!(arc_segs.insert(key), "segment {key:?} in two arcs");
            }
        }

        let mut ring_segs = HashSet::new();
        for region in &regions {
            for ring in std::iter::once(&region.shell).chain(region.holes.iter()) {
                for w in ring.windows(2) {
                    ring_segs.insert(super::seg_key(w[0], w[1]));
                }
            }
        }
        assert_eq!(arc_segs, ring_segs);
    }

    #[test]
    fn enclosed_region_shares_one_closed_arc() {
        #[rustfmt::skip]
        let data = vec![
            1, 1, 1,
            1, 2, 1,
            1, 1, 1,
        ];
        let regions = regions_of(3, 3, data);
        let d = decompose_rings(&regions, &TileFrame::interior());

        assert_eq!(d.table.len(), 2);
        assert!(d.table.arcs.iter().all(|a| a.closed));

        let outer_idx = regions.iter().position(|r| r.label == 1).expect("label 1");
        let inner_idx = regions.iter().position(|r| r.label == 2).expect("label 2");

        let hole_ref = d.rings[outer_idx].holes[0].arcs[0];
        let shell_ref = d.rings[inner_idx].shell.arcs[0];
        assert_eq!(hole_ref.arc, shell_ref.arc);
        assert_ne!(hole_ref.reversed, shell_ref.reversed);

        // Seed is the lexicographically smallest vertex of the shared loop.
        let arc = d.table.get(shell_ref.arc);
        assert_eq!(arc.lattice[0], pp(1, 1));
        assert_eq!(arc.lattice.last(), Some(&pp(1, 1)));
    }

    #[test]
    fn seam_vertices_force_junctions() {
        let regions = regions_of(2, 2, vec![1, 1, 1, 1]);

        let frame = TileFrame {
            east: Some(2),
            ..TileFrame::interior()
        };
        let d = decompose_rings(&regions, &frame);

        // Without the seam the square would be one closed arc; the forced
        // junctions at (2, 0), (2, 1), (2, 2) split it into open arcs.
        assert!(d.table.len() >= 3);
        for arc in &d.table.arcs {
            assert!(!arc.closed);
            let (a, b) = arc.endpoints();
            assert!(frame.on_seam(a) && frame.on_seam(b));
        }

        let shell = d.lattice_ring(&d.rings[0].shell);
        assert!(is_rotation(&shell, &regions[0].shell));
    }
}
