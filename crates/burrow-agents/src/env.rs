//! The seam between agent behaviors and the shared world.
//!
//! Behaviors see the world only through [`AgentEnv`]. The coordinator
//! implements it over the grid, both region partitions and the node table;
//! tests implement it with small fakes. The trait is `Sync` because every
//! agent of a tick reads the same environment from a worker thread.

use burrow_types::{PoiId, WorldPoint};
use burrow_world::WorldError;
use serde::{Deserialize, Serialize};

use crate::error::ResourceError;
use crate::policy::DecisionPolicy;

/// Which region partition a route resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionLayer {
    /// Every active resource node.
    Extraction,
    /// Only nodes currently claimed by a miner.
    Supply,
}

/// Where a travel state wants to go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathTarget {
    /// A fixed world position.
    Point(WorldPoint),
    /// The POI owning the region under the agent.
    Region(RegionLayer),
}

/// A route ready to be walked.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    /// World positions of the cells along the path, start included.
    pub waypoints: Vec<WorldPoint>,
    /// The POI at the end of a region route.
    pub poi: Option<PoiId>,
    /// Weighted path cost.
    pub cost: u32,
}

/// Something an agent did that the coordinator must settle after the
/// parallel phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Carried primary units were handed in at home.
    Stockpiled {
        /// Units handed in.
        amount: u32,
    },
    /// Secondary units were delivered to a node.
    Delivered {
        /// Receiving node.
        node: PoiId,
        /// Units delivered.
        amount: u32,
    },
}

/// Shared environment available to every state hook.
pub trait AgentEnv: Sync {
    /// Side length of a grid cell, used as the waypoint arrival radius.
    fn node_diameter(&self) -> f32;

    /// Plan a route from `from` to `target`.
    fn plan_route(&self, from: WorldPoint, target: PathTarget) -> Result<PlannedRoute, WorldError>;

    /// Take one primary unit from a node.
    fn try_extract(&self, node: PoiId) -> Result<(), ResourceError>;

    /// Take one secondary unit from a node.
    fn try_consume(&self, node: PoiId) -> Result<(), ResourceError>;

    /// The policy steering free-roaming agents.
    fn policy(&self) -> &dyn DecisionPolicy;
}
