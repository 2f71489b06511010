//! Spatial layer of the Burrow agent economy.
//!
//! This crate models the ground the agents walk on: a weighted grid sampled
//! once from the environment, an A* pathfinder over it, and a partition of
//! the grid into regions owned by the cheapest-reachable point of interest.
//!
//! # Modules
//!
//! - [`grid`] -- [`PathGrid`] construction from a [`TerrainSampler`],
//!   point-to-cell clamping and 8-connected neighbors.
//! - [`pathfinder`] -- A* search with axis/diagonal step costs plus cell
//!   weights, and the octile heuristic.
//! - [`partition`] -- [`RegionPartition`]: per-cell argmin over a cached
//!   cost table, with cheap recomputation when the active set changes.
//! - [`snapshot`] -- JSON blobs of the grid and cost cache for restoring a
//!   partition without searching.
//! - [`error`] -- Error types for grid, search and partition operations.

pub mod error;
pub mod grid;
pub mod partition;
pub mod pathfinder;
pub mod snapshot;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use grid::{Cell, GridSpec, PathGrid, Terrain, TerrainLayout, TerrainSampler};
pub use partition::{CostCache, PointOfInterest, RegionPartition};
pub use pathfinder::{GridPath, find_path, octile, path_cost};
pub use snapshot::PartitionSnapshot;
