//! Agent states, flags and the behaviors attached to them.
//!
//! Every agent kind draws its states and flags from the same two enums;
//! a kind only differs in which of them its descriptor wires (see
//! [`crate::kinds`]).

pub mod consume;
pub mod extract;
pub mod follow_path;
pub mod steer;
pub mod timed_action;

use serde::{Deserialize, Serialize};

use crate::body::AgentBody;
use crate::env::AgentEnv;
use crate::fsm::{BoxedBehavior, MachineKey, StateBehavior, StateCx, StateMachine, Transition};

pub use consume::Consume;
pub use extract::Extract;
pub use follow_path::FollowPath;
pub use steer::Steer;
pub use timed_action::{Completion, TimedAction};

/// Every state an agent machine can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Waiting for a flag or a forced state.
    Idle,
    /// Travelling to the node owning the agent's extraction region.
    GoToNode,
    /// Extracting at the claimed node.
    Extract,
    /// Eating at the claimed node.
    Consume,
    /// Travelling to where carried units are dropped.
    GoToDeposit,
    /// Dropping carried units.
    Deposit,
    /// Travelling home to pick up supplies.
    GoToSource,
    /// Picking up supplies.
    Load,
    /// Evacuating to the shelter.
    GoToShelter,
    /// Waiting out an emergency.
    Shelter,
}

impl AgentState {
    /// All states, in index order.
    pub const ALL: [Self; 10] = [
        Self::Idle,
        Self::GoToNode,
        Self::Extract,
        Self::Consume,
        Self::GoToDeposit,
        Self::Deposit,
        Self::GoToSource,
        Self::Load,
        Self::GoToShelter,
        Self::Shelter,
    ];
}

impl MachineKey for AgentState {
    const COUNT: usize = Self::ALL.len();

    fn index(self) -> usize {
        self as usize
    }
}

/// Every flag a behavior or the coordinator can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentFlag {
    /// The route's final waypoint was reached.
    NearTarget,
    /// No route could be planned.
    MoveFailed,
    /// The claimed node has nothing left.
    ResourceEmpty,
    /// The inventory reached its cap.
    InventoryFull,
    /// The inventory was handed over.
    InventoryEmpty,
    /// Enough extractions happened that the agent must eat.
    Hungry,
    /// A meal succeeded.
    Consumed,
    /// An emergency was declared.
    Emergency,
    /// The region partitions changed.
    MapUpdated,
}

impl AgentFlag {
    /// All flags, in index order.
    pub const ALL: [Self; 9] = [
        Self::NearTarget,
        Self::MoveFailed,
        Self::ResourceEmpty,
        Self::InventoryFull,
        Self::InventoryEmpty,
        Self::Hungry,
        Self::Consumed,
        Self::Emergency,
        Self::MapUpdated,
    ];
}

impl MachineKey for AgentFlag {
    const COUNT: usize = Self::ALL.len();

    fn index(self) -> usize {
        self as usize
    }
}

/// Hook context of an agent behavior.
pub type AgentCx<'a> = StateCx<'a, AgentFlag, AgentBody, dyn AgentEnv>;

/// A boxed agent behavior.
pub type AgentBehavior = BoxedBehavior<AgentFlag, AgentBody, dyn AgentEnv>;

/// The machine every agent runs.
pub type AgentMachine = StateMachine<AgentState, AgentFlag, AgentBody, dyn AgentEnv>;

/// A transition of an agent machine.
pub type AgentTransition = Transition<AgentState, AgentFlag>;

/// Behavior that does nothing. Used for idle and shelter states.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wait;

impl StateBehavior<AgentFlag, AgentBody, dyn AgentEnv> for Wait {}

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted environment for behavior tests.

    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use burrow_types::{PoiId, WorldPoint};
    use burrow_world::WorldError;

    use crate::env::{AgentEnv, PathTarget, PlannedRoute};
    use crate::error::ResourceError;
    use crate::policy::{DecisionPolicy, StubPolicy};

    /// Fixed routes and per-node stock counts.
    pub struct FakeEnv {
        pub route: Option<PlannedRoute>,
        pub primary: Mutex<BTreeMap<PoiId, u32>>,
        pub secondary: Mutex<BTreeMap<PoiId, u32>>,
        pub policy: Box<dyn DecisionPolicy>,
    }

    impl FakeEnv {
        pub fn new() -> Self {
            Self {
                route: None,
                primary: Mutex::new(BTreeMap::new()),
                secondary: Mutex::new(BTreeMap::new()),
                policy: Box::new(StubPolicy::new(2)),
            }
        }

        pub fn with_route(mut self, points: &[(f32, f32)], poi: Option<PoiId>) -> Self {
            self.route = Some(PlannedRoute {
                waypoints: points.iter().map(|&(x, y)| WorldPoint::new(x, y)).collect(),
                poi,
                cost: 0,
            });
            self
        }

        pub fn with_stock(self, node: PoiId, primary: u32, secondary: u32) -> Self {
            if let Ok(mut map) = self.primary.lock() {
                map.insert(node, primary);
            }
            if let Ok(mut map) = self.secondary.lock() {
                map.insert(node, secondary);
            }
            self
        }

        fn take(map: &Mutex<BTreeMap<PoiId, u32>>, node: PoiId) -> Result<(), ResourceError> {
            let mut map = map.lock().map_err(|_| ResourceError::UnknownNode(node))?;
            let count = map.get_mut(&node).ok_or(ResourceError::UnknownNode(node))?;
            if *count == 0 {
                return Err(ResourceError::Depleted(node));
            }
            *count -= 1;
            Ok(())
        }
    }

    impl AgentEnv for FakeEnv {
        fn node_diameter(&self) -> f32 {
            1.0
        }

        fn plan_route(&self, from: WorldPoint, _target: PathTarget) -> Result<PlannedRoute, WorldError> {
            self.route.clone().ok_or(WorldError::PathNotFound {
                from: burrow_types::GridCoord::new(from.x as u32, from.y as u32),
                to: burrow_types::GridCoord::new(0, 0),
            })
        }

        fn try_extract(&self, node: PoiId) -> Result<(), ResourceError> {
            Self::take(&self.primary, node)
        }

        fn try_consume(&self, node: PoiId) -> Result<(), ResourceError> {
            Self::take(&self.secondary, node)
        }

        fn policy(&self) -> &dyn DecisionPolicy {
            self.policy.as_ref()
        }
    }
}
