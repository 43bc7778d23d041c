use std::thread;

use gv_arc::{decompose_rings, reassemble_polygons};
use gv_core::{Affine, GridView, PixelPoint, Polygon};
use gv_region::extract_region_polygons;
use gv_smooth::{ArcTransform, apply_chain, default_chain};
use log::debug;

use crate::error::{ConfigError, PolygonizeError, TileErrorKind, TileFailure};
use crate::layout::{TileDescriptor, tile_layout};
use crate::pool::{Cancellation, run_tiles};
use crate::seam::{self, SeamReport};

/// Pipeline configuration. Defaults follow the common case: 200-pixel
/// tiles, one worker per available core, tolerance of two pixels, five
/// smoothing passes.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonizeConfig {
    pub tile_size: usize,
    pub workers: usize,
    /// Ground size of one pixel; derived from the affine when `None`.
    pub meters_per_pixel: Option<f64>,
    /// Simplification tolerance in pixels: `window * meters_per_pixel`.
    pub simplification_pixel_window: f64,
    pub smoothing_iterations: usize,
}

impl Default for PolygonizeConfig {
    fn default() -> Self {
        Self {
            tile_size: 200,
            workers: thread::available_parallelism().map_or(1, |n| n.get()),
            meters_per_pixel: None,
            simplification_pixel_window: 2.0,
            smoothing_iterations: 5,
        }
    }
}

impl PolygonizeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size == 0 {
            return Err(ConfigError::ZeroTileSize);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.simplification_pixel_window < 0.0 {
            return Err(ConfigError::NegativeTolerance);
        }
        Ok(())
    }
}

/// Progress of one tile through the pipeline. The first five states run
/// inside a worker; `Seamed` is assigned sequentially during the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Pending,
    Extracted,
    Decomposed,
    Transformed,
    Reassembled,
    Seamed,
}

pub(crate) struct TileOutput {
    pub col: usize,
    pub row: usize,
    pub state: TileState,
    pub polygons: Vec<(i32, Polygon)>,
    pub seams: SeamReport,
}

/// All polygons of one label, merged across tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPolygons {
    pub label: i32,
    pub polygons: Vec<Polygon>,
}

/// Final vector layer: one entry per label, sorted by label.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorLayer {
    pub classes: Vec<ClassPolygons>,
}

/// Polygonize with the default simplify-then-smooth chain.
pub fn polygonize(
    grid: &GridView<'_, i32>,
    affine: &Affine,
    nodata: Option<i32>,
    cfg: &PolygonizeConfig,
) -> Result<VectorLayer, PolygonizeError> {
    cfg.validate()?;
    let pixel_size = cfg.meters_per_pixel.unwrap_or_else(|| affine.pixel_size());
    let tolerance = cfg.simplification_pixel_window * pixel_size;
    let chain = default_chain(tolerance, cfg.smoothing_iterations);
    polygonize_with(grid, affine, nodata, cfg, &chain, &Cancellation::new())
}

/// Polygonize with an explicit per-arc transform chain and an external
/// cancellation flag (for signal handling in the CLI).
pub fn polygonize_with(
    grid: &GridView<'_, i32>,
    affine: &Affine,
    nodata: Option<i32>,
    cfg: &PolygonizeConfig,
    transforms: &[Box<dyn ArcTransform>],
    cancel: &Cancellation,
) -> Result<VectorLayer, PolygonizeError> {
    cfg.validate()?;

    if grid.width() == 0 || grid.height() == 0 {
        return Err(PolygonizeError::EmptyGrid);
    }
    if !has_data(grid, nodata) {
        return Err(PolygonizeError::AllNodata);
    }

    let descriptors = tile_layout(grid.width(), grid.height(), cfg.tile_size);
    debug!(
        "polygonizing {}x{} grid as {} tiles on {} workers",
        grid.width(),
        grid.height(),
        descriptors.len(),
        cfg.workers
    );

    let results = run_tiles(
        descriptors,
        cfg.workers,
        4 * cfg.workers,
        cancel,
        |desc, cancel| process_tile(grid, affine, nodata, transforms, desc, cancel),
    );

    let mut outputs = Vec::new();
    let mut failures = Vec::new();
    for r in results {
        match r.outcome {
            Ok(output) => outputs.push(output),
            Err(TileErrorKind::Cancelled) => {}
            Err(kind) => failures.push(TileFailure {
                col: r.col,
                row: r.row,
                kind,
            }),
        }
    }

    if !failures.is_empty() {
        return Err(PolygonizeError::Tiles(failures));
    }
    if cancel.is_cancelled() {
        return Err(PolygonizeError::Cancelled);
    }

    seam::verify_seams(&outputs)?;
    Ok(VectorLayer {
        classes: seam::union_by_label(outputs),
    })
}

fn has_data(grid: &GridView<'_, i32>, nodata: Option<i32>) -> bool {
    let Some(nodata) = nodata else {
        return true;
    };
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if grid.get(x, y).is_some_and(|&v| v != nodata) {
                return true;
            }
        }
    }
    false
}

fn process_tile(
    grid: &GridView<'_, i32>,
    affine: &Affine,
    nodata: Option<i32>,
    transforms: &[Box<dyn ArcTransform>],
    desc: &TileDescriptor,
    cancel: &Cancellation,
) -> Result<TileOutput, TileErrorKind> {
    let (col, row) = (desc.col, desc.row);
    let mut state = TileState::Pending;
    debug!("tile ({col}, {row}) -> {state:?}");

    if cancel.is_cancelled() {
        return Err(TileErrorKind::Cancelled);
    }

    let view = grid.view_window(desc.window).map_err(TileErrorKind::Grid)?;
    let origin = PixelPoint::new(desc.window.x0 as i64, desc.window.y0 as i64);
    let regions = extract_region_polygons(&view, nodata, origin);
    state = TileState::Extracted;
    debug!("tile ({col}, {row}) -> {state:?}: {} regions", regions.len());
    if cancel.is_cancelled() {
        return Err(TileErrorKind::Cancelled);
    }

    let mut decomposition = decompose_rings(&regions, &desc.frame());
    decomposition.table.project(affine);
    state = TileState::Decomposed;
    debug!(
        "tile ({col}, {row}) -> {state:?}: {} arcs",
        decomposition.table.len()
    );
    if cancel.is_cancelled() {
        return Err(TileErrorKind::Cancelled);
    }

    apply_chain(&mut decomposition.table, transforms).map_err(TileErrorKind::Transform)?;
    state = TileState::Transformed;
    debug!("tile ({col}, {row}) -> {state:?}");
    if cancel.is_cancelled() {
        return Err(TileErrorKind::Cancelled);
    }

    let polygons =
        reassemble_polygons(&regions, &decomposition).map_err(TileErrorKind::Reassemble)?;
    state = TileState::Reassembled;
    debug!("tile ({col}, {row}) -> {state:?}: {} polygons", polygons.len());

    let seams = seam::seam_reports(grid, nodata, desc);
    Ok(TileOutput {
        col,
        row,
        state,
        polygons,
        seams,
    })
}

#[cfg(test)]
mod tests {
    use super::{PolygonizeConfig, polygonize, polygonize_with};
    use crate::error::{ConfigError, PolygonizeError, TileErrorKind};
    use crate::pool::Cancellation;
    use gv_core::{Affine, Grid, Point2, signed_area};
    use gv_smooth::{ArcTransform, default_chain};

    fn exact_config(tile_size: usize, workers: usize) -> PolygonizeConfig {
        PolygonizeConfig {
            tile_size,
            workers,
            meters_per_pixel: None,
            simplification_pixel_window: 0.0,
            smoothing_iterations: 0,
        }
    }

    fn total_area(layer: &super::VectorLayer) -> f64 {
        let mut total = 0.0;
        for class in &layer.classes {
            for p in &class.polygons {
                total += signed_area(&p.shell);
                for h in &p.holes {
                    total += signed_area(h);
                }
            }
        }
        total
    }

    #[test]
    fn single_label_square_collapses_to_corners() {
        let g = Grid::from_vec(2, 2, vec![1; 4]).expect("valid grid");
        let layer = polygonize(
            &g.as_view(),
            &Affine::unit(),
            None,
            &exact_config(100, 1),
        )
        .expect("polygonize succeeds");

        assert_eq!(layer.classes.len(), 1);
        assert_eq!(layer.classes[0].label, 1);
        assert_eq!(layer.classes[0].polygons.len(), 1);

        let shell = &layer.classes[0].polygons[0].shell;
        assert_eq!(shell.len(), 5);
        for corner in [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ] {
            assert!(shell.contains(&corner), "missing corner {corner:?}");
        }
    }

    #[test]
    fn seam_union_restores_single_rectangle() {
        // Two tiles across, one label: the merged layer is one rectangle
        // with no duplicate seam edge and no gap.
        let g = Grid::from_vec(8, 4, vec![7; 32]).expect("valid grid");
        let layer = polygonize(&g.as_view(), &Affine::unit(), None, &exact_config(4, 2))
            .expect("polygonize succeeds");

        assert_eq!(layer.classes.len(), 1);
        assert_eq!(layer.classes[0].polygons.len(), 1);
        let p = &layer.classes[0].polygons[0];
        assert!(p.holes.is_empty());
        assert!((signed_area(&p.shell) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn adjacent_labels_share_seam_geometry() {
        #[rustfmt::skip]
        let data = vec![
            1, 1, 2, 2,
            1, 1, 2, 2,
        ];
        let g = Grid::from_vec(4, 2, data).expect("valid grid");
        let layer = polygonize(&g.as_view(), &Affine::unit(), None, &exact_config(2, 2))
            .expect("polygonize succeeds");

        assert_eq!(layer.classes.len(), 2);
        let one = &layer.classes[0].polygons[0].shell;
        let two = &layer.classes[1].polygons[0].shell;

        // The boundary between the labels is the tile seam; both polygons
        // carry its endpoints bitwise.
        for p in [Point2::new(2.0, 0.0), Point2::new(2.0, 2.0)] {
            assert!(one.contains(&p));
            assert!(two.contains(&p));
        }
        assert!((total_area(&layer) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn coverage_and_labels_preserved_across_tilings() {
        #[rustfmt::skip]
        let data = vec![
            5, 5, 9, 9, 9, 2,
            5, 0, 9, 2, 2, 2,
            5, 5, 9, 2, 0, 2,
            5, 5, 5, 2, 2, 2,
        ];
        let g = Grid::from_vec(6, 4, data).expect("valid grid");

        for tile_size in [1, 2, 3, 100] {
            let layer = polygonize(
                &g.as_view(),
                &Affine::unit(),
                Some(0),
                &exact_config(tile_size, 3),
            )
            .expect("polygonize succeeds");

            let labels: Vec<i32> = layer.classes.iter().map(|c| c.label).collect();
            assert_eq!(labels, vec![2, 5, 9], "tile_size {tile_size}");
            // 22 data pixels.
            assert!(
                (total_area(&layer) - 22.0).abs() < 1e-9,
                "tile_size {tile_size}"
            );
        }
    }

    #[test]
    fn checkerboard_diagonals_stay_separate() {
        let g = Grid::from_vec(2, 2, vec![1, 2, 2, 1]).expect("valid grid");
        let layer = polygonize(&g.as_view(), &Affine::unit(), None, &exact_config(100, 1))
            .expect("polygonize succeeds");

        assert_eq!(layer.classes.len(), 2);
        for class in &layer.classes {
            assert_eq!(class.polygons.len(), 2, "label {}", class.label);
            for p in &class.polygons {
                assert!((signed_area(&p.shell) - 1.0).abs() < 1e-12);
                assert!(p.holes.is_empty());
            }
        }
    }

    #[test]
    fn output_is_deterministic() {
        let mut data = Vec::new();
        for y in 0..16i32 {
            for x in 0..16i32 {
                data.push((x / 3 + y / 5) % 4);
            }
        }
        let g = Grid::from_vec(16, 16, data).expect("valid grid");
        let cfg = PolygonizeConfig {
            tile_size: 5,
            workers: 4,
            meters_per_pixel: None,
            // Below the 1-pixel corner deviation, so no ring can thin out
            // into a degenerate sliver on this input.
            simplification_pixel_window: 0.5,
            smoothing_iterations: 2,
        };

        let a = polygonize(&g.as_view(), &Affine::unit(), None, &cfg).expect("first run");
        let b = polygonize(&g.as_view(), &Affine::unit(), None, &cfg).expect("second run");
        assert_eq!(a, b);
    }

    #[test]
    fn aggressive_simplification_keeps_coverage_exact() {
        // Two deep label-2 pockets pinched around a 1-pixel label-1
        // isthmus. A two-pixel tolerance thins the pockets to triangles,
        // but every moved boundary is a shared arc, so what one label loses
        // the other gains and total coverage stays exact.
        let mut data = vec![1i32; 49];
        for row in [0usize, 1, 2, 4, 5, 6] {
            data[row * 7 + 3] = 2;
        }
        let g = Grid::from_vec(7, 7, data).expect("valid grid");

        let cfg = PolygonizeConfig {
            tile_size: 100,
            workers: 1,
            meters_per_pixel: None,
            simplification_pixel_window: 2.0,
            smoothing_iterations: 0,
        };
        let layer =
            polygonize(&g.as_view(), &Affine::unit(), None, &cfg).expect("polygonize succeeds");

        let labels: Vec<i32> = layer.classes.iter().map(|c| c.label).collect();
        assert_eq!(labels, vec![1, 2]);
        assert_eq!(layer.classes[1].polygons.len(), 2);
        assert!((total_area(&layer) - 49.0).abs() < 1e-9);
    }

    #[test]
    fn zero_workers_is_a_config_error() {
        let g = Grid::from_vec(2, 2, vec![1; 4]).expect("valid grid");
        let err = polygonize(&g.as_view(), &Affine::unit(), None, &exact_config(4, 0))
            .expect_err("invalid config");
        assert_eq!(err, PolygonizeError::Config(ConfigError::ZeroWorkers));
    }

    #[test]
    fn all_nodata_is_fatal() {
        let g = Grid::from_vec(3, 3, vec![0; 9]).expect("valid grid");
        let err = polygonize(&g.as_view(), &Affine::unit(), Some(0), &exact_config(4, 1))
            .expect_err("no data pixels");
        assert_eq!(err, PolygonizeError::AllNodata);
    }

    struct BreakPinning;

    impl ArcTransform for BreakPinning {
        fn name(&self) -> &'static str {
            "break_pinning"
        }

        fn apply(&self, points: &[gv_core::Point2], _closed: bool) -> Vec<gv_core::Point2> {
            points
                .iter()
                .map(|p| gv_core::Point2::new(p.x + 0.25, p.y))
                .collect()
        }
    }

    #[test]
    fn transform_violations_report_the_tile() {
        let g = Grid::from_vec(8, 4, vec![7; 32]).expect("valid grid");
        let chain: Vec<Box<dyn ArcTransform>> = vec![Box::new(BreakPinning)];

        let err = polygonize_with(
            &g.as_view(),
            &Affine::unit(),
            None,
            &exact_config(4, 1),
            &chain,
            &Cancellation::new(),
        )
        .expect_err("pinning violated");

        match err {
            PolygonizeError::Tiles(failures) => {
                assert!(!failures.is_empty());
                assert!(matches!(failures[0].kind, TileErrorKind::Transform(_)));
            }
            other => panic!("expected tile failures, got {other:?}"),
        }
    }

    #[test]
    fn pre_cancelled_run_returns_cancelled() {
        let g = Grid::from_vec(4, 4, vec![1; 16]).expect("valid grid");
        let cancel = Cancellation::new();
        cancel.cancel();

        let err = polygonize_with(
            &g.as_view(),
            &Affine::unit(),
            None,
            &exact_config(2, 2),
            &default_chain(0.0, 0),
            &cancel,
        )
        .expect_err("cancelled before start");
        assert_eq!(err, PolygonizeError::Cancelled);
    }

    #[test]
    fn smoothing_preserves_coverage_of_junction_free_layouts() {
        // A full-frame single label smooths its one closed ring; the area
        // shrinks at the corners but topology stays a single shell.
        let g = Grid::from_vec(6, 6, vec![3; 36]).expect("valid grid");
        let cfg = PolygonizeConfig {
            tile_size: 100,
            workers: 1,
            meters_per_pixel: None,
            simplification_pixel_window: 0.0,
            smoothing_iterations: 2,
        };
        let layer =
            polygonize(&g.as_view(), &Affine::unit(), None, &cfg).expect("polygonize succeeds");

        assert_eq!(layer.classes[0].polygons.len(), 1);
        let area = signed_area(&layer.classes[0].polygons[0].shell);
        assert!(area > 30.0 && area < 36.0);
    }
}
