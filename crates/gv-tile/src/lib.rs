//! Tiled parallel polygonization of categorical rasters.
//!
//! The label grid is split into square tiles. A fixed pool of worker
//! threads runs extraction, arc decomposition, per-arc transforms and
//! reassembly on each tile independently; every lattice vertex on a tile
//! seam is a forced junction, so no arc ever crosses a seam and seam
//! geometry stays pixel-exact on both sides. The merge phase verifies that
//! adjacent tiles agree on their shared seam vertices, then unions each
//! label's polygons by cancelling opposite directed seam segments -- an
//! exact operation because seam coordinates agree bitwise.
//!
//! Workers never share mutable state; they receive borrowed views into the
//! grid and report results over a bounded channel. Completion order is
//! arbitrary; results are sorted by `(row, col)` before merging, so output
//! is deterministic for a given configuration.

mod error;
mod layout;
mod pipeline;
mod pool;
mod seam;

pub use error::{ConfigError, PolygonizeError, TileErrorKind, TileFailure};
pub use gv_arc::TileFrame;
pub use layout::{TileDescriptor, tile_layout};
pub use pipeline::{
    ClassPolygons, PolygonizeConfig, TileState, VectorLayer, polygonize, polygonize_with,
};
pub use pool::Cancellation;
