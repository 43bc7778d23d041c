//! Shared-boundary arc topology for region polygons.
//!
//! Rings of adjacent regions share pixel-exact vertices, so every undirected
//! unit segment of every ring belongs to either exactly two regions or to
//! one region and the outside. This crate decomposes a tile's rings into the
//! minimum set of *arcs* (maximal polylines whose interior vertices sit
//! between the same two regions), records per ring the ordered directed arc
//! sequence needed to rebuild it, and rebuilds polygons from the arcs after
//! per-arc transforms have run.
//!
//! Junction vertices (three or more distinct adjacent regions, counting the
//! outside; pinch vertices with more than two incident segments; and forced
//! junctions on tile seams) delimit arcs and stay pinned through every
//! transform. A ring with no junction at all becomes a single closed arc
//! anchored at its lexicographically smallest vertex.
//!
//! Arcs live in an id-indexed table owned by the tile; rings refer to arcs
//! by id instead of sharing mutable geometry.

mod decompose;
mod reassemble;
mod table;

pub use decompose::{Decomposition, TileFrame, decompose_rings};
pub use reassemble::{ReassembleError, reassemble_polygons};
pub use table::{ArcId, ArcRef, ArcTable, BoundaryArc, RegionId, RegionRings, RingArcs, Side};
