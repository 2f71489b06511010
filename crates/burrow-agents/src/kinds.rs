//! Agent kinds as data.
//!
//! A [`KindDescriptor`] lists the states a kind uses, the role each state
//! plays, the transition edges, and the handful of states the coordinator
//! needs to know about (initial, idle, evacuation, shelter). A single
//! builder, [`build_machine`], turns any descriptor plus a [`KindTuning`]
//! into a ready machine, so miners and haulers differ only in their tables.

use burrow_types::AgentKind;

use crate::config::KindTuning;
use crate::env::{PathTarget, RegionLayer};
use crate::states::{
    AgentBehavior, AgentFlag, AgentMachine, AgentState, Completion, Consume, Extract, FollowPath,
    Steer, TimedAction, Wait,
};

/// Where a travel state goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The kind's home point.
    Home,
    /// The shelter point.
    Shelter,
    /// The POI owning the agent's region in a partition layer.
    Region(RegionLayer),
}

/// What a state does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRole {
    /// Nothing; waits for a flag or a forced state. Roams by policy when
    /// the tuning asks for it and the state is the kind's idle state.
    Wait,
    /// Follow a route.
    Travel(Destination),
    /// Extract at the claimed node.
    Extract,
    /// Eat at the claimed node.
    Consume,
    /// Timed action raising `flag`.
    Timed {
        /// Raised on completion.
        flag: AgentFlag,
        /// Applied on exit after completion.
        effect: TimedEffect,
    },
}

/// Completion effect of a timed state, resolved against the tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedEffect {
    /// Load `load_amount` units.
    Load,
    /// Hand carried units in at home.
    Stockpile,
    /// Hand carried units to the claimed node.
    Deliver,
}

/// Static wiring of one agent kind.
#[derive(Debug)]
pub struct KindDescriptor {
    /// The kind described.
    pub kind: AgentKind,
    /// Registered states and their roles.
    pub states: &'static [(AgentState, StateRole)],
    /// Transition edges `(from, flag, to)`.
    pub edges: &'static [(AgentState, AgentFlag, AgentState)],
    /// Forced on spawn.
    pub initial: AgentState,
    /// Forced when no resource node remains.
    pub idle: AgentState,
    /// Forced when an emergency starts.
    pub evacuate: AgentState,
    /// Reached at the end of an evacuation.
    pub shelter: AgentState,
    /// Sub-states that resume as their parent travel state after an
    /// emergency. Unlisted states resume as themselves.
    pub resume: &'static [(AgentState, AgentState)],
    /// Whether the kind routes over the supply layer and must hear about
    /// partition changes.
    pub map_dependent: bool,
}

/// Miners: travel to a node, extract, eat on site, haul home.
pub static MINER: KindDescriptor = KindDescriptor {
    kind: AgentKind::Miner,
    states: &[
        (AgentState::Idle, StateRole::Wait),
        (AgentState::GoToNode, StateRole::Travel(Destination::Region(RegionLayer::Extraction))),
        (AgentState::Extract, StateRole::Extract),
        (AgentState::Consume, StateRole::Consume),
        (AgentState::GoToDeposit, StateRole::Travel(Destination::Home)),
        (
            AgentState::Deposit,
            StateRole::Timed {
                flag: AgentFlag::InventoryEmpty,
                effect: TimedEffect::Stockpile,
            },
        ),
        (AgentState::GoToShelter, StateRole::Travel(Destination::Shelter)),
        (AgentState::Shelter, StateRole::Wait),
    ],
    edges: &[
        (AgentState::Idle, AgentFlag::MapUpdated, AgentState::GoToNode),
        (AgentState::GoToNode, AgentFlag::NearTarget, AgentState::Extract),
        (AgentState::GoToNode, AgentFlag::ResourceEmpty, AgentState::GoToNode),
        (AgentState::GoToNode, AgentFlag::MoveFailed, AgentState::GoToDeposit),
        (AgentState::GoToNode, AgentFlag::Emergency, AgentState::GoToShelter),
        (AgentState::Extract, AgentFlag::InventoryFull, AgentState::GoToDeposit),
        (AgentState::Extract, AgentFlag::Hungry, AgentState::Consume),
        (AgentState::Extract, AgentFlag::ResourceEmpty, AgentState::GoToNode),
        (AgentState::Extract, AgentFlag::Emergency, AgentState::GoToShelter),
        (AgentState::Consume, AgentFlag::Consumed, AgentState::Extract),
        (AgentState::Consume, AgentFlag::ResourceEmpty, AgentState::GoToDeposit),
        (AgentState::Consume, AgentFlag::Emergency, AgentState::GoToShelter),
        (AgentState::GoToDeposit, AgentFlag::NearTarget, AgentState::Deposit),
        // An unreachable home parks the miner instead of replanning forever.
        (AgentState::GoToDeposit, AgentFlag::MoveFailed, AgentState::Idle),
        (AgentState::GoToDeposit, AgentFlag::Emergency, AgentState::GoToShelter),
        (AgentState::Deposit, AgentFlag::InventoryEmpty, AgentState::GoToNode),
        (AgentState::Deposit, AgentFlag::Emergency, AgentState::GoToShelter),
        (AgentState::GoToShelter, AgentFlag::NearTarget, AgentState::Shelter),
    ],
    initial: AgentState::GoToNode,
    idle: AgentState::Idle,
    evacuate: AgentState::GoToShelter,
    shelter: AgentState::Shelter,
    resume: &[
        (AgentState::Extract, AgentState::GoToNode),
        (AgentState::Consume, AgentState::GoToNode),
        (AgentState::Deposit, AgentState::GoToDeposit),
    ],
    map_dependent: false,
};

/// Haulers: load supplies at home, deliver them to nodes being worked.
pub static HAULER: KindDescriptor = KindDescriptor {
    kind: AgentKind::Hauler,
    states: &[
        (AgentState::Idle, StateRole::Wait),
        (AgentState::GoToSource, StateRole::Travel(Destination::Home)),
        (
            AgentState::Load,
            StateRole::Timed {
                flag: AgentFlag::InventoryFull,
                effect: TimedEffect::Load,
            },
        ),
        (AgentState::GoToDeposit, StateRole::Travel(Destination::Region(RegionLayer::Supply))),
        (
            AgentState::Deposit,
            StateRole::Timed {
                flag: AgentFlag::InventoryEmpty,
                effect: TimedEffect::Deliver,
            },
        ),
        (AgentState::GoToShelter, StateRole::Travel(Destination::Shelter)),
        (AgentState::Shelter, StateRole::Wait),
    ],
    edges: &[
        (AgentState::Idle, AgentFlag::MapUpdated, AgentState::GoToDeposit),
        (AgentState::GoToSource, AgentFlag::NearTarget, AgentState::Load),
        (AgentState::GoToSource, AgentFlag::MoveFailed, AgentState::Idle),
        (AgentState::GoToSource, AgentFlag::Emergency, AgentState::GoToShelter),
        (AgentState::GoToSource, AgentFlag::MapUpdated, AgentState::GoToSource),
        (AgentState::Load, AgentFlag::InventoryFull, AgentState::GoToDeposit),
        (AgentState::Load, AgentFlag::Emergency, AgentState::GoToShelter),
        (AgentState::GoToDeposit, AgentFlag::NearTarget, AgentState::Deposit),
        (AgentState::GoToDeposit, AgentFlag::MoveFailed, AgentState::Idle),
        (AgentState::GoToDeposit, AgentFlag::Emergency, AgentState::GoToShelter),
        (AgentState::GoToDeposit, AgentFlag::MapUpdated, AgentState::GoToDeposit),
        (AgentState::Deposit, AgentFlag::InventoryEmpty, AgentState::GoToSource),
        (AgentState::Deposit, AgentFlag::Emergency, AgentState::GoToShelter),
        (AgentState::GoToShelter, AgentFlag::NearTarget, AgentState::Shelter),
        (AgentState::GoToShelter, AgentFlag::MoveFailed, AgentState::Idle),
        (AgentState::GoToShelter, AgentFlag::MapUpdated, AgentState::GoToShelter),
    ],
    initial: AgentState::Idle,
    idle: AgentState::Idle,
    evacuate: AgentState::GoToShelter,
    shelter: AgentState::Shelter,
    resume: &[
        (AgentState::Load, AgentState::GoToSource),
        (AgentState::Deposit, AgentState::GoToDeposit),
    ],
    map_dependent: true,
};

impl KindDescriptor {
    /// The descriptor of a kind.
    pub fn of(kind: AgentKind) -> &'static Self {
        match kind {
            AgentKind::Miner => &MINER,
            AgentKind::Hauler => &HAULER,
        }
    }

    /// The state an agent resumes after an emergency, given the state it
    /// was in when the emergency started.
    pub fn resume_state(&self, state: AgentState) -> AgentState {
        self.resume
            .iter()
            .find(|(from, _)| *from == state)
            .map_or(state, |(_, to)| *to)
    }

    /// The role of a state, if the kind uses it.
    pub fn role(&self, state: AgentState) -> Option<StateRole> {
        self.states.iter().find(|(s, _)| *s == state).map(|(_, role)| *role)
    }
}

fn behavior_for(descriptor: &KindDescriptor, state: AgentState, role: StateRole, tuning: &KindTuning) -> AgentBehavior {
    match role {
        StateRole::Wait if state == descriptor.idle && tuning.roam_when_idle => {
            Box::new(Steer::new(tuning.home, tuning.speed, vec![AgentFlag::MapUpdated]))
        }
        StateRole::Wait => Box::new(Wait),
        StateRole::Travel(destination) => {
            let target = match destination {
                Destination::Home => PathTarget::Point(tuning.home),
                Destination::Shelter => PathTarget::Point(tuning.shelter),
                Destination::Region(layer) => PathTarget::Region(layer),
            };
            Box::new(FollowPath::new(target, tuning.speed))
        }
        StateRole::Extract => Box::new(Extract::new(
            tuning.extract_interval,
            tuning.max_carry,
            tuning.actions_per_food,
        )),
        StateRole::Consume => Box::new(Consume::new(tuning.consume_interval)),
        StateRole::Timed { flag, effect } => {
            let (duration, completion) = match effect {
                TimedEffect::Load => (
                    tuning.load_duration,
                    Completion::Load {
                        amount: tuning.load_amount,
                    },
                ),
                TimedEffect::Stockpile => (tuning.deposit_duration, Completion::Stockpile),
                TimedEffect::Deliver => (tuning.deposit_duration, Completion::DeliverToClaim),
            };
            Box::new(TimedAction::new(duration, flag, completion))
        }
    }
}

/// Build the machine of a kind. The current state is left unset; the
/// caller forces the initial state once the agent's body exists.
pub fn build_machine(descriptor: &KindDescriptor, tuning: &KindTuning) -> AgentMachine {
    let mut machine = AgentMachine::new();
    for &(state, role) in descriptor.states {
        machine.add_state(state, behavior_for(descriptor, state, role, tuning));
    }
    for &(from, flag, to) in descriptor.edges {
        machine.set_transition(from, flag, to);
    }
    machine
}
