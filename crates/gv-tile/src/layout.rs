use gv_arc::TileFrame;
use gv_core::Window;

/// One tile of the raster: its own pixel window plus a 1-pixel halo shared
/// with each neighbor that exists. The halo is how a worker sees across a
/// seam (seam reports need the neighbor's first pixel row or column); tile
/// polygons themselves cover only the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDescriptor {
    pub col: usize,
    pub row: usize,
    pub window: Window,
    pub halo: Window,
}

impl TileDescriptor {
    /// Seam lines of this tile: a side has a seam iff the halo extends past
    /// the window there, i.e. a neighboring tile exists on that side.
    pub fn frame(&self) -> TileFrame {
        TileFrame {
            west: (self.halo.x0 < self.window.x0).then_some(self.window.x0 as i64),
            east: (self.halo.x1 > self.window.x1).then_some(self.window.x1 as i64),
            north: (self.halo.y0 < self.window.y0).then_some(self.window.y0 as i64),
            south: (self.halo.y1 > self.window.y1).then_some(self.window.y1 as i64),
        }
    }
}

/// Square tiling of a `width x height` grid, row-major. Edge tiles are
/// clamped to the grid extent.
pub fn tile_layout(width: usize, height: usize, tile_size: usize) -> Vec<TileDescriptor> {
    let mut tiles = Vec::new();

    let mut row = 0;
    let mut y0 = 0;
    while y0 < height {
        let y1 = (y0 + tile_size).min(height);

        let mut col = 0;
        let mut x0 = 0;
        while x0 < width {
            let x1 = (x0 + tile_size).min(width);

            tiles.push(TileDescriptor {
                col,
                row,
                window: Window::new(x0, y0, x1, y1),
                halo: Window::new(
                    x0.saturating_sub(1),
                    y0.saturating_sub(1),
                    (x1 + 1).min(width),
                    (y1 + 1).min(height),
                ),
            });

            col += 1;
            x0 = x1;
        }

        row += 1;
        y0 = y1;
    }

    tiles
}

#[cfg(test)]
mod tests {
    use super::tile_layout;
    use gv_core::Window;

    #[test]
    fn layout_covers_grid_without_overlap() {
        let tiles = tile_layout(10, 7, 4);

        assert_eq!(tiles.len(), 6);
        let area: usize = tiles.iter().map(|t| t.window.width() * t.window.height()).sum();
        assert_eq!(area, 70);

        // Row-major ordering.
        assert_eq!((tiles[0].col, tiles[0].row), (0, 0));
        assert_eq!((tiles[1].col, tiles[1].row), (1, 0));
        assert_eq!((tiles[3].col, tiles[3].row), (0, 1));

        // Edge tiles clamp.
        assert_eq!(tiles[2].window, Window::new(8, 0, 10, 4));
        assert_eq!(tiles[5].window, Window::new(8, 4, 10, 7));
    }

    #[test]
    fn frames_mark_interior_seams_only() {
        let tiles = tile_layout(8, 4, 4);
        assert_eq!(tiles.len(), 2);

        let left = tiles[0].frame();
        assert_eq!(left.west, None);
        assert_eq!(left.east, Some(4));
        assert_eq!(left.north, None);
        assert_eq!(left.south, None);

        let right = tiles[1].frame();
        assert_eq!(right.west, Some(4));
        assert_eq!(right.east, None);
    }

    #[test]
    fn single_tile_has_no_seams() {
        let tiles = tile_layout(3, 3, 100);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].frame(), gv_arc::TileFrame::interior());
    }
}
