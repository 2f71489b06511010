//! Shared type definitions for the Burrow agent economy.
//!
//! This crate is the single source of truth for the small value types that
//! flow between the world, agent and coordinator crates.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers for agents and points of interest
//! - [`enums`] -- Agent kinds and resource kinds
//! - [`geometry`] -- Grid coordinates and continuous world points

pub mod enums;
pub mod geometry;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{AgentKind, Resource};
pub use geometry::{GridCoord, WorldPoint};
pub use ids::{AgentId, PoiId};
