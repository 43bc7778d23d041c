/// Integer pixel-corner position, global to the raster.
///
/// `(x, y)` names the lattice corner shared by pixels `(x-1, y-1)` and
/// `(x, y)`. The derived `Ord` is lexicographic on `(x, y)`, which defines
/// the canonical seed of closed arcs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

impl PixelPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Planar map coordinate produced by the affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bit-pattern key for exact map-coordinate identity.
///
/// Seam coordinates on both sides of a tile boundary are produced from the
/// same lattice points through the same affine, so their bit patterns match.
#[inline]
pub fn point_key(p: Point2) -> (u64, u64) {
    (p.x.to_bits(), p.y.to_bits())
}

/// Closed ring on the lattice; first point equals last.
pub type LatticeRing = Vec<PixelPoint>;

/// One connected component of equal-label pixels: outer shell plus holes,
/// all rings closed and on the lattice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPolygon {
    pub label: i32,
    pub shell: LatticeRing,
    pub holes: Vec<LatticeRing>,
}

/// Finished map-space polygon: shell ring plus hole rings, all closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub shell: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
}

/// Twice the signed area of a closed lattice ring (shoelace).
///
/// Positive for shells, negative for holes under the region-on-left tracing
/// convention with row growing downward.
pub fn signed_area2_lattice(ring: &[PixelPoint]) -> i128 {
    let mut acc: i128 = 0;
    for w in ring.windows(2) {
        acc += w[0].x as i128 * w[1].y as i128 - w[1].x as i128 * w[0].y as i128;
    }
    acc
}

/// Signed area of a closed map-space ring (shoelace).
pub fn signed_area(ring: &[Point2]) -> f64 {
    let mut acc = 0.0;
    for w in ring.windows(2) {
        acc += w[0].x * w[1].y - w[1].x * w[0].y;
    }
    acc * 0.5
}

/// Even-odd containment of a probe point in a closed axis-aligned lattice
/// ring, with the probe given in doubled coordinates.
///
/// `probe2.1` must be odd (the probe sits mid-way between lattice rows), so
/// the horizontal ray never passes through a ring vertex and the test is
/// exact integer arithmetic. Midpoints of vertical ring edges satisfy this.
pub fn lattice_ring_contains(ring: &[PixelPoint], probe2: (i64, i64)) -> bool {
    debug_assert!(probe2.1 % 2 != 0, "probe row must be a half-integer");

    let mut inside = false;
    for w in ring.windows(2) {
        let (a, b) = (w[0], w[1]);
        if a.x != b.x {
            continue;
        }

        let (ylo, yhi) = if a.y < b.y { (a.y, b.y) } else { (b.y, a.y) };
        if 2 * ylo < probe2.1 && probe2.1 < 2 * yhi && 2 * a.x > probe2.0 {
            inside = !inside;
        }
    }
    inside
}

/// Even-odd containment of a map-space point in a closed ring.
pub fn ring_contains(ring: &[Point2], p: Point2) -> bool {
    let mut inside = false;
    for w in ring.windows(2) {
        let (a, b) = (w[0], w[1]);
        if (a.y > p.y) != (b.y > p.y) {
            let t = (p.y - a.y) / (b.y - a.y);
            let x = a.x + t * (b.x - a.x);
            if x > p.x {
                inside = !inside;
            }
        }
    }
    inside
}
