use gv_core::{Affine, PixelPoint, Point2};

pub type ArcId = usize;
pub type RegionId = usize;

/// One side of an arc: a region of the tile, or the tile complement.
///
/// Sides are region identities, not labels: two same-label regions meeting
/// a boundary vertex diagonally are distinct sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Outside,
    Region(RegionId),
}

/// Maximal boundary polyline between exactly two sides.
///
/// `lattice` is the pixel-exact geometry the arc was built from; `points`
/// is the map-space geometry handed to transforms. For a closed arc the
/// first and last entries are the canonical seed vertex.
#[derive(Debug, Clone)]
pub struct BoundaryArc {
    pub id: ArcId,
    pub lattice: Vec<PixelPoint>,
    pub points: Vec<Point2>,
    pub left: Side,
    pub right: Side,
    pub closed: bool,
}

impl BoundaryArc {
    pub fn endpoints(&self) -> (PixelPoint, PixelPoint) {
        (
            *self.lattice.first().expect("arc has at least two points"),
            *self.lattice.last().expect("arc has at least two points"),
        )
    }
}

/// Directed reference to an arc from a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcRef {
    pub arc: ArcId,
    pub reversed: bool,
}

/// Ordered arc sequence reconstructing one ring.
#[derive(Debug, Clone, Default)]
pub struct RingArcs {
    pub arcs: Vec<ArcRef>,
}

/// Ring-arc indices for one region polygon: shell first, then holes in the
/// region's hole order.
#[derive(Debug, Clone)]
pub struct RegionRings {
    pub shell: RingArcs,
    pub holes: Vec<RingArcs>,
}

/// Arena of all arcs in one tile.
#[derive(Debug, Clone, Default)]
pub struct ArcTable {
    pub arcs: Vec<BoundaryArc>,
}

impl ArcTable {
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    pub fn get(&self, id: ArcId) -> &BoundaryArc {
        &self.arcs[id]
    }

    /// Fill map-space geometry from the lattice through `affine`.
    ///
    /// Both tiles adjacent to a seam derive seam coordinates from the same
    /// global lattice points, so the resulting `f64`s agree bitwise.
    pub fn project(&mut self, affine: &Affine) {
        for arc in &mut self.arcs {
            arc.points = arc.lattice.iter().map(|&p| affine.apply(p)).collect();
        }
    }
}
