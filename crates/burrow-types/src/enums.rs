//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

/// The behavioral program an agent runs.
///
/// Kinds differ only in which states and flags their machine wires; the
/// engine that runs them is the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Travels to a resource node, extracts the primary resource, eats the
    /// secondary resource on site and hauls extracted units home.
    Miner,
    /// Loads supplies at home and delivers them to nodes currently being
    /// worked by miners.
    Hauler,
}

impl AgentKind {
    /// All kinds, in a stable order.
    pub const ALL: [Self; 2] = [Self::Miner, Self::Hauler];

    /// Lowercase name used in logs and configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Miner => "miner",
            Self::Hauler => "hauler",
        }
    }
}

impl core::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two resources a node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// The extracted resource (minerals). A node is spent when it runs out.
    Primary,
    /// The consumable kept at a node (food). Replenished by haulers.
    Secondary,
}
