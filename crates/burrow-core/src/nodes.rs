//! Resource nodes and the table that serializes access to them.
//!
//! Each node sits behind its own [`parking_lot::Mutex`], so agents working
//! different nodes never contend. The table itself is behind a coarse
//! [`parking_lot::RwLock`] that is only written when nodes are added, which
//! never happens while agents are ticking.
//!
//! A node whose primary count reaches zero is marked inactive inside the
//! same critical section and queued as depleted. The coordinator drains the
//! queue after the parallel phase and applies the side effects (partition
//! updates, notifications).

use std::collections::BTreeMap;

use burrow_agents::ResourceError;
use burrow_types::{GridCoord, PoiId, Resource};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// A depletable resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Identity, shared with the node's POI in both partitions.
    pub id: PoiId,
    /// Grid cell the node sits on.
    pub cell: GridCoord,
    /// Units left to extract.
    pub remaining_primary: u32,
    /// Units left to consume.
    pub remaining_secondary: u32,
    /// `false` once `remaining_primary` has reached zero.
    pub active: bool,
}

impl ResourceNode {
    /// A fresh, active node.
    pub const fn new(id: PoiId, cell: GridCoord, primary: u32, secondary: u32) -> Self {
        Self {
            id,
            cell,
            remaining_primary: primary,
            remaining_secondary: secondary,
            active: primary > 0,
        }
    }

    /// Units left of `resource`.
    pub const fn remaining(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Primary => self.remaining_primary,
            Resource::Secondary => self.remaining_secondary,
        }
    }
}

/// All nodes, keyed by id.
#[derive(Debug, Default)]
pub struct NodeTable {
    nodes: RwLock<BTreeMap<PoiId, Mutex<ResourceNode>>>,
    depleted: Mutex<Vec<PoiId>>,
}

impl NodeTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns `false` (and keeps the old node) if the id is
    /// taken.
    pub fn insert(&self, node: ResourceNode) -> bool {
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&node.id) {
            return false;
        }
        nodes.insert(node.id, Mutex::new(node));
        true
    }

    /// A copy of a node's current state.
    pub fn get(&self, id: PoiId) -> Option<ResourceNode> {
        self.nodes.read().get(&id).map(|node| *node.lock())
    }

    /// Copies of every node, in id order.
    pub fn snapshot(&self) -> Vec<ResourceNode> {
        self.nodes.read().values().map(|node| *node.lock()).collect()
    }

    /// Number of nodes, active or not.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether the table has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Ids of the nodes that still hold primary units.
    pub fn active_ids(&self) -> Vec<PoiId> {
        self.nodes
            .read()
            .iter()
            .filter(|(_, node)| node.lock().active)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Take one primary unit.
    ///
    /// The check and the decrement happen under the node's lock, so two
    /// callers can never both take the last unit. Taking the last unit
    /// deactivates the node and queues it as depleted.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Depleted`] if the node is inactive and
    /// [`ResourceError::UnknownNode`] if it does not exist.
    pub fn try_extract(&self, id: PoiId) -> Result<(), ResourceError> {
        let nodes = self.nodes.read();
        let slot = nodes.get(&id).ok_or(ResourceError::UnknownNode(id))?;
        let mut node = slot.lock();
        if !node.active || node.remaining_primary == 0 {
            return Err(ResourceError::Depleted(id));
        }
        node.remaining_primary -= 1;
        if node.remaining_primary == 0 {
            node.active = false;
            self.depleted.lock().push(id);
        }
        Ok(())
    }

    /// Take one secondary unit.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Depleted`] if the node is inactive or has no
    /// secondary units and [`ResourceError::UnknownNode`] if it does not
    /// exist.
    pub fn try_consume(&self, id: PoiId) -> Result<(), ResourceError> {
        let nodes = self.nodes.read();
        let slot = nodes.get(&id).ok_or(ResourceError::UnknownNode(id))?;
        let mut node = slot.lock();
        if !node.active || node.remaining_secondary == 0 {
            return Err(ResourceError::Depleted(id));
        }
        node.remaining_secondary -= 1;
        Ok(())
    }

    /// Add secondary units to a node. Deliveries to an inactive node are
    /// refused.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Depleted`] if the node is inactive and
    /// [`ResourceError::UnknownNode`] if it does not exist.
    pub fn deliver(&self, id: PoiId, amount: u32) -> Result<u32, ResourceError> {
        let nodes = self.nodes.read();
        let slot = nodes.get(&id).ok_or(ResourceError::UnknownNode(id))?;
        let mut node = slot.lock();
        if !node.active {
            return Err(ResourceError::Depleted(id));
        }
        node.remaining_secondary = node.remaining_secondary.saturating_add(amount);
        Ok(node.remaining_secondary)
    }

    /// Take the ids depleted since the last call, in depletion order.
    pub fn drain_depleted(&self) -> Vec<PoiId> {
        std::mem::take(&mut *self.depleted.lock())
    }
}
