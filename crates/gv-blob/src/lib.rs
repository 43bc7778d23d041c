//! Minimal speckle cleaning for categorical grids.
//!
//! Regions smaller than `min_blob_size` pixels are cleared and refilled by
//! iterated 8-neighbor majority vote, so speckle dissolves into whichever
//! larger regions surround it. This runs strictly before vectorization;
//! the polygonization pipeline never re-runs it.
//!
//! Nodata pixels are immovable: they are never filled, never counted as
//! blobs, and never vote.

use gv_core::Grid;
use gv_region::label_components;

const HOLE: i32 = i32::MIN;

/// Re-label every component smaller than `min_blob_size` from its
/// surroundings, in place.
pub fn fill_small_blobs(grid: &mut Grid<i32>, min_blob_size: usize, nodata: Option<i32>) {
    if min_blob_size <= 1 {
        return;
    }

    let (w, h) = (grid.width(), grid.height());
    let comps = label_components(&grid.as_view(), nodata);
    let original = grid.data().to_vec();

    let mut holes = 0usize;
    {
        let data = grid.data_mut();
        for (i, &comp) in comps.comp_at.iter().enumerate() {
            if comp >= 0 && comps.sizes[comp as usize] < min_blob_size {
                data[i] = HOLE;
                holes += 1;
            }
        }
    }

    // Grow surviving labels into the cleared pixels, one ring per pass.
    while holes > 0 {
        let filled = fill_pass(grid, w, h, nodata);
        if filled == 0 {
            break;
        }
        holes -= filled;
    }

    // Speckle with no larger region to vote for it (an island surrounded by
    // nodata) keeps its original label.
    if holes > 0 {
        let data = grid.data_mut();
        for (i, v) in data.iter_mut().enumerate() {
            if *v == HOLE {
                *v = original[i];
            }
        }
    }
}

fn fill_pass(grid: &mut Grid<i32>, w: usize, h: usize, nodata: Option<i32>) -> usize {
    let snapshot = grid.data().to_vec();
    let data = grid.data_mut();
    let mut filled = 0usize;

    for y in 0..h {
        for x in 0..w {
            if snapshot[y * w + x] != HOLE {
                continue;
            }

            if let Some(value) = neighborhood_mode(&snapshot, w, h, x, y, nodata) {
                data[y * w + x] = value;
                filled += 1;
            }
        }
    }

    filled
}

/// Most frequent valid label among the 8 neighbors; ties break toward the
/// smallest label so refilling is deterministic.
fn neighborhood_mode(
    data: &[i32],
    w: usize,
    h: usize,
    x: usize,
    y: usize,
    nodata: Option<i32>,
) -> Option<i32> {
    let mut values = [0i32; 8];
    let mut n = 0usize;

    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (nx, ny) = (x as i64 + dx, y as i64 + dy);
            if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                continue;
            }

            let v = data[ny as usize * w + nx as usize];
            if v == HOLE || nodata == Some(v) {
                continue;
            }
            values[n] = v;
            n += 1;
        }
    }

    let mut best: Option<(i32, usize)> = None;
    for i in 0..n {
        let v = values[i];
        let count = values[..n].iter().filter(|&&o| o == v).count();
        let better = match best {
            None => true,
            Some((bv, bc)) => count > bc || (count == bc && v < bv),
        };
        if better {
            best = Some((v, count));
        }
    }

    best.map(|(v, _)| v)
}

#[cfg(test)]
mod tests {
    use super::fill_small_blobs;
    use gv_core::Grid;

    #[test]
    fn speckle_dissolves_into_surrounding_region() {
        #[rustfmt::skip]
        let data = vec![
            1, 1, 1,
            1, 9, 1,
            1, 1, 1,
        ];
        let mut g = Grid::from_vec(3, 3, data).expect("valid grid");
        fill_small_blobs(&mut g, 2, None);

        assert!(g.data().iter().all(|&v| v == 1));
    }

    #[test]
    fn large_regions_survive() {
        #[rustfmt::skip]
        let data = vec![
            1, 1, 2, 2,
            1, 1, 2, 2,
        ];
        let mut g = Grid::from_vec(4, 2, data).expect("valid grid");
        let before = g.data().to_vec();
        fill_small_blobs(&mut g, 4, None);

        assert_eq!(g.data(), &before[..]);
    }

    #[test]
    fn fill_spreads_across_wide_gaps() {
        // A 1x5 strip of speckle between two large regions fills from both
        // ends over multiple passes.
        #[rustfmt::skip]
        let data = vec![
            1, 1, 7, 8, 9, 2, 2,
            1, 1, 7, 8, 9, 2, 2,
            1, 1, 7, 8, 9, 2, 2,
        ];
        let mut g = Grid::from_vec(7, 3, data).expect("valid grid");
        fill_small_blobs(&mut g, 4, None);

        for &v in g.data() {
            assert!(v == 1 || v == 2, "unexpected label {v}");
        }
    }

    #[test]
    fn nodata_never_fills_and_never_votes() {
        #[rustfmt::skip]
        let data = vec![
            0, 0, 0,
            0, 5, 0,
            0, 0, 1,
        ];
        let mut g = Grid::from_vec(3, 3, data).expect("valid grid");
        fill_small_blobs(&mut g, 2, Some(0));

        // The lone 5 has only nodata and other speckle around it, so there
        // is nothing to fill from; it keeps its label and nodata stays put.
        assert_eq!(g.data()[0], 0);
        assert_eq!(g.data()[1], 0);
        assert_eq!(g.data()[4], 5);
        assert_eq!(g.data()[8], 1);
    }
}
