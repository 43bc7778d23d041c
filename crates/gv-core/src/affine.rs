use crate::{PixelPoint, Point2};

/// Affine transform from lattice coordinates to map coordinates, in
/// row-major coefficient order:
///
/// ```text
/// x' = a * col + b * row + c
/// y' = d * col + e * row + f
/// ```
///
/// For a north-up raster `a` is the pixel width, `e` the (negative) pixel
/// height, and `(c, f)` the map position of the top-left raster corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Identity transform: lattice coordinates are map coordinates.
    pub fn unit() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// Map position of a lattice corner.
    ///
    /// Evaluation order is fixed so the same lattice point always produces
    /// the same bit pattern, independent of which tile evaluates it.
    #[inline]
    pub fn apply(&self, p: PixelPoint) -> Point2 {
        let col = p.x as f64;
        let row = p.y as f64;
        Point2::new(
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Euclidean length of one column step; the default unit for
    /// simplification tolerances.
    pub fn pixel_size(&self) -> f64 {
        (self.a * self.a + self.d * self.d).sqrt()
    }
}
