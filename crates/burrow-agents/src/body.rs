//! Agent-local data the state hooks read and write.

use burrow_types::{PoiId, WorldPoint};
use serde::{Deserialize, Serialize};

use crate::env::AgentEvent;

/// Position, inventory and bookkeeping of one agent.
///
/// Only the owning agent's hooks touch a body, so none of it is
/// synchronized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentBody {
    /// Current world position.
    pub position: WorldPoint,
    /// Units currently carried (primary for miners, secondary for haulers).
    pub carried: u32,
    /// Successful extractions since the inventory was last full.
    pub extractions: u32,
    /// The node this agent last reached through a region route.
    pub claimed: Option<PoiId>,
    /// The node of the region route currently being walked.
    pub heading: Option<PoiId>,
    /// Events waiting for the coordinator.
    #[serde(skip)]
    outbox: Vec<AgentEvent>,
}

impl AgentBody {
    /// A body standing at `position` carrying `carried` units.
    pub fn at(position: WorldPoint, carried: u32) -> Self {
        Self {
            position,
            carried,
            ..Self::default()
        }
    }

    /// Queue an event for the coordinator.
    pub fn emit(&mut self, event: AgentEvent) {
        self.outbox.push(event);
    }

    /// Take all queued events.
    pub fn drain_events(&mut self) -> Vec<AgentEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Hand over everything carried, leaving the inventory empty.
    pub fn take_carried(&mut self) -> u32 {
        std::mem::take(&mut self.carried)
    }

    /// Forget the claimed node if it is `node`. Returns whether it was.
    pub fn release_claim(&mut self, node: PoiId) -> bool {
        if self.claimed == Some(node) {
            self.claimed = None;
            return true;
        }
        false
    }

    /// Whether the body holds or is travelling to `node`.
    pub fn references(&self, node: PoiId) -> bool {
        self.claimed == Some(node) || self.heading == Some(node)
    }
}
