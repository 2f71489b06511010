//! Agent behavior for the Burrow economy.
//!
//! This crate is the logic layer for agents: a generic state machine, the
//! behaviors attached to its states, and the per-kind wiring. It never
//! touches shared state directly; everything outside an agent's own body
//! goes through the [`AgentEnv`] seam, which the coordinator implements.
//!
//! # Modules
//!
//! - [`fsm`] -- Generic table-driven [`StateMachine`] with enter/tick/exit
//!   hooks and queued flags.
//! - [`states`] -- [`AgentState`], [`AgentFlag`] and the behaviors: path
//!   following, timed actions, extraction, consumption, policy steering.
//! - [`kinds`] -- [`KindDescriptor`] tables for miners and haulers and the
//!   one [`build_machine`] routine that wires them.
//! - [`agent`] -- [`Agent`]: body plus machine, emergency bookkeeping.
//! - [`body`] -- Agent-local position, inventory, claim and outbox.
//! - [`env`] -- The [`AgentEnv`] seam and route/event types.
//! - [`policy`] -- The opaque [`DecisionPolicy`] seam and a stub.
//! - [`config`] -- Per-kind tunables ([`KindTuning`]).
//! - [`error`] -- [`AgentError`] and [`ResourceError`].

pub mod agent;
pub mod body;
pub mod config;
pub mod env;
pub mod error;
pub mod fsm;
pub mod kinds;
pub mod policy;
pub mod states;

// Re-export primary types at crate root for convenience.
pub use agent::Agent;
pub use body::AgentBody;
pub use config::KindTuning;
pub use env::{AgentEnv, AgentEvent, PathTarget, PlannedRoute, RegionLayer};
pub use error::{AgentError, ResourceError};
pub use fsm::{MachineKey, StateBehavior, StateCx, StateMachine, Transition};
pub use kinds::{KindDescriptor, build_machine};
pub use policy::{DecisionPolicy, PolicyDecision, StubPolicy};
pub use states::{AgentFlag, AgentMachine, AgentState, AgentTransition};
