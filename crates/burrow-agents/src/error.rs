//! Error types for the burrow-agents crate.
//!
//! Nothing here is fatal. Resource failures reach a state behavior, which
//! turns them into flags; agent errors reach the host through the
//! coordinator.

use burrow_types::{AgentId, AgentKind, PoiId};

/// Errors from agent bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Agent with the given ID is not tracked.
    #[error("agent not found: {0}")]
    UnknownAgent(AgentId),

    /// The kind already has its maximum number of agents.
    #[error("spawn cap reached for {kind}: {cap} agents")]
    SpawnCapReached {
        /// The kind that could not be spawned.
        kind: AgentKind,
        /// The configured cap.
        cap: u32,
    },
}

/// Errors from extraction and consumption attempts against a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// The node has none of the requested resource left (or is inactive).
    #[error("resource depleted at node {0}")]
    Depleted(PoiId),

    /// No node with this id exists.
    #[error("unknown resource node {0}")]
    UnknownNode(PoiId),
}
