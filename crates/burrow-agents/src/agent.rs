//! A running agent: identity, body and machine.
//!
//! The [`Agent`] wraps a kind's machine together with the body its hooks
//! act on. It also carries the emergency bookkeeping: when an emergency
//! starts, the agent remembers the coarse state it should resume (see
//! [`KindDescriptor::resume_state`]) and is forced into its evacuation
//! state; when the emergency ends it is forced back.

use burrow_types::{AgentId, AgentKind, PoiId, WorldPoint};

use crate::body::AgentBody;
use crate::config::KindTuning;
use crate::env::{AgentEnv, AgentEvent};
use crate::kinds::{KindDescriptor, build_machine};
use crate::states::{AgentFlag, AgentMachine, AgentState, AgentTransition};

/// One agent.
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    descriptor: &'static KindDescriptor,
    body: AgentBody,
    machine: AgentMachine,
    remembered: Option<AgentState>,
}

impl Agent {
    /// Create an agent of `kind` at `position` and force its initial state.
    ///
    /// Haulers start loaded with one trip's worth of supplies. Returns the
    /// agent and any transitions the initial enter hook caused.
    pub fn spawn(
        kind: AgentKind,
        tuning: &KindTuning,
        position: WorldPoint,
        env: &(dyn AgentEnv + 'static),
    ) -> (Self, Vec<AgentTransition>) {
        let descriptor = KindDescriptor::of(kind);
        let carried = match kind {
            AgentKind::Hauler => tuning.load_amount,
            AgentKind::Miner => 0,
        };
        let mut agent = Self {
            id: AgentId::new(),
            descriptor,
            body: AgentBody::at(position, carried),
            machine: build_machine(descriptor, tuning),
            remembered: None,
        };
        let transitions = agent.force(descriptor.initial, env);
        (agent, transitions)
    }

    /// The agent's id.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// The agent's kind.
    pub const fn kind(&self) -> AgentKind {
        self.descriptor.kind
    }

    /// The kind's wiring.
    pub const fn descriptor(&self) -> &'static KindDescriptor {
        self.descriptor
    }

    /// Position, inventory and claim.
    pub const fn body(&self) -> &AgentBody {
        &self.body
    }

    /// Current machine state.
    pub const fn state(&self) -> Option<AgentState> {
        self.machine.current()
    }

    /// The state to resume once the current emergency ends.
    pub const fn remembered(&self) -> Option<AgentState> {
        self.remembered
    }

    /// Whether the kind reacts to partition changes.
    pub const fn is_map_dependent(&self) -> bool {
        self.descriptor.map_dependent
    }

    /// Advance the current state by `dt` seconds.
    pub fn tick(&mut self, env: &(dyn AgentEnv + 'static), dt: f32) -> Vec<AgentTransition> {
        self.machine.tick(&mut self.body, env, dt)
    }

    /// Raise a flag from outside.
    pub fn raise(&mut self, flag: AgentFlag, env: &(dyn AgentEnv + 'static)) -> Vec<AgentTransition> {
        self.machine.raise_flag(flag, &mut self.body, env)
    }

    /// Force a state, bypassing the transition table.
    pub fn force(&mut self, state: AgentState, env: &(dyn AgentEnv + 'static)) -> Vec<AgentTransition> {
        self.machine.force_state(state, &mut self.body, env)
    }

    /// Start evacuating. Returns `false` if the agent is already evacuating
    /// or has no state yet.
    pub fn begin_emergency(&mut self, env: &(dyn AgentEnv + 'static)) -> bool {
        if self.remembered.is_some() {
            return false;
        }
        let Some(current) = self.state() else {
            return false;
        };
        self.remembered = Some(self.descriptor.resume_state(current));
        self.force(self.descriptor.evacuate, env);
        true
    }

    /// Return to the remembered state. Returns `false` if there was no
    /// emergency to end.
    pub fn end_emergency(&mut self, env: &(dyn AgentEnv + 'static)) -> bool {
        let Some(state) = self.remembered.take() else {
            return false;
        };
        self.force(state, env);
        true
    }

    /// Force the kind's idle state and forget any emergency memory, so a
    /// later end of the emergency leaves the agent parked.
    pub fn park(&mut self, env: &(dyn AgentEnv + 'static)) -> Vec<AgentTransition> {
        self.remembered = None;
        self.body.claimed = None;
        self.force(self.descriptor.idle, env)
    }

    /// React to a node running dry: if the agent claimed it or is walking
    /// toward it, drop the claim and raise [`AgentFlag::ResourceEmpty`].
    pub fn node_depleted(&mut self, node: PoiId, env: &(dyn AgentEnv + 'static)) -> Vec<AgentTransition> {
        if !self.body.references(node) {
            return Vec::new();
        }
        self.body.release_claim(node);
        self.raise(AgentFlag::ResourceEmpty, env)
    }

    /// Take the events the agent produced since the last call.
    pub fn drain_events(&mut self) -> Vec<AgentEvent> {
        self.body.drain_events()
    }
}
