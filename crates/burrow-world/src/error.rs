//! Error types for the `burrow-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use burrow_types::{GridCoord, PoiId};

/// Errors that can occur during grid, search and partition operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The search frontier emptied without reaching the goal.
    #[error("no path from {from} to {to}")]
    PathNotFound {
        /// Start cell.
        from: GridCoord,
        /// Goal cell.
        to: GridCoord,
    },

    /// A region lookup happened while no point of interest is active.
    #[error("no active point of interest")]
    NoActivePoi,

    /// The cell is not assigned to any region (no active point of interest
    /// is reachable from it).
    #[error("cell {0} has no reachable point of interest")]
    Unassigned(GridCoord),

    /// The point of interest is not registered with the partition.
    #[error("point of interest not found: {0}")]
    UnknownPoi(PoiId),

    /// A point of interest with this id is already registered.
    #[error("duplicate point of interest id: {0}")]
    DuplicatePoi(PoiId),

    /// A coordinate lies outside the grid.
    #[error("cell {cell} is outside the {width}x{height} grid")]
    OutOfBounds {
        /// The offending coordinate.
        cell: GridCoord,
        /// Grid width in cells.
        width: u32,
        /// Grid height in cells.
        height: u32,
    },

    /// The grid extent or layout cannot produce a usable grid.
    #[error("invalid grid: {reason}")]
    InvalidGrid {
        /// What is wrong with the input.
        reason: String,
    },

    /// Encoding or decoding a partition snapshot failed.
    #[error("snapshot codec error: {source}")]
    Snapshot {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
