use core::fmt;

use gv_arc::ReassembleError;
use gv_core::Error as GridError;
use gv_smooth::TransformError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroTileSize,
    ZeroWorkers,
    NegativeTolerance,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTileSize => write!(f, "tile size must be at least 1 pixel"),
            Self::ZeroWorkers => write!(f, "worker count must be at least 1"),
            Self::NegativeTolerance => {
                write!(f, "simplification window must be non-negative")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Why one tile failed. `Cancelled` is bookkeeping, not a failure: tiles
/// abandoned after another tile's fatal error report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileErrorKind {
    Grid(GridError),
    Transform(TransformError),
    Reassemble(ReassembleError),
    Panicked,
    Cancelled,
}

impl TileErrorKind {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for TileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(e) => write!(f, "grid access failed: {e}"),
            Self::Transform(e) => write!(f, "arc transform violated its contract: {e}"),
            Self::Reassemble(e) => write!(f, "reassembly failed: {e}"),
            Self::Panicked => write!(f, "worker panicked"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFailure {
    pub col: usize,
    pub row: usize,
    pub kind: TileErrorKind,
}

impl fmt::Display for TileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile ({}, {}): {}", self.col, self.row, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PolygonizeError {
    Config(ConfigError),
    EmptyGrid,
    AllNodata,
    Cancelled,
    Tiles(Vec<TileFailure>),
    /// Adjacent tiles disagree on the pixel-exact seam vertex set. Forced
    /// junctioning makes this impossible for correct inputs; seeing it
    /// means an implementation bug.
    SeamMismatch {
        a: (usize, usize),
        b: (usize, usize),
    },
}

impl fmt::Display for PolygonizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::EmptyGrid => write!(f, "label grid has zero extent"),
            Self::AllNodata => write!(f, "label grid contains no data pixels"),
            Self::Cancelled => write!(f, "run cancelled"),
            Self::Tiles(failures) => {
                write!(f, "{} tile(s) failed", failures.len())?;
                if let Some(first) = failures.first() {
                    write!(f, "; first: {first}")?;
                }
                Ok(())
            }
            Self::SeamMismatch { a, b } => write!(
                f,
                "tiles ({}, {}) and ({}, {}) disagree on their seam vertex set",
                a.0, a.1, b.0, b.1
            ),
        }
    }
}

impl std::error::Error for PolygonizeError {}

impl From<ConfigError> for PolygonizeError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
