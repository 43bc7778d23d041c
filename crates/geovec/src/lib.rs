//! Umbrella crate for the `geovec` workspace.
//!
//! Re-exports the grid and geometry primitives, the per-arc transforms and
//! the tiled polygonization pipeline. Most users only need
//! [`polygonize`] plus [`PolygonizeConfig`].

pub use gv_blob::fill_small_blobs;
pub use gv_core::*;
pub use gv_smooth::{ArcTransform, Chaikin, Rdp, TransformError, default_chain};
pub use gv_tile::*;
