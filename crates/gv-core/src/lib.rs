//! Foundational primitives for categorical-raster vectorization.
//!
//! ## Grids and Stride
//! Label grids use element stride (not byte stride). `stride` is the distance,
//! in elements, between adjacent row starts and may be greater than `width`.
//! This allows borrowed views over tile windows of a larger raster without
//! copying pixel data.
//!
//! ## Coordinate Spaces
//! Two coordinate spaces coexist. Lattice coordinates ([`PixelPoint`]) are
//! integer pixel-corner positions, global to the raster: `(x, y)` is the
//! corner shared by pixels `(x-1, y-1)` and `(x, y)`. All topology (segment
//! hashing, junction identity, seam matching) happens on the lattice, where
//! equality is exact. Map coordinates ([`Point2`]) are `f64` positions
//! produced by applying the [`Affine`] transform to lattice points; two map
//! points derived from the same lattice point through the same affine are
//! bitwise equal.
//!
//! ## Orientation
//! Signed areas use the shoelace formula on `(col, row)` axes with row
//! growing downward. Shell rings are stored with positive signed area and
//! holes with negative; the final output stage re-orients rings for the map
//! coordinate frame.

mod affine;
mod error;
mod geom;
mod grid;

pub use affine::Affine;
pub use error::Error;
pub use geom::{
    LatticeRing, PixelPoint, Point2, Polygon, RegionPolygon, lattice_ring_contains, point_key,
    ring_contains, signed_area, signed_area2_lattice,
};
pub use grid::{Grid, GridView, Window};
