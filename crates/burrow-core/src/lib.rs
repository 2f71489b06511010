//! Coordination layer of the Burrow agent economy.
//!
//! This crate ties the world and agent crates together: it owns the
//! resource nodes and the agents, runs every agent's machine in parallel
//! each tick, settles what the agents did, and keeps the region partitions
//! in step with the nodes that remain and the nodes in use.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `burrow-config.yaml` into
//!   strongly-typed structs.
//! - [`nodes`] -- [`ResourceNode`] and the per-node-locked [`NodeTable`].
//! - [`shared`] -- [`SharedWorld`], the [`AgentEnv`] every agent ticks
//!   against.
//! - [`coordinator`] -- [`Coordinator`]: spawning, the tick phases, the
//!   emergency toggle.
//! - [`operator`] -- [`OperatorState`] for pause, speed, stop, spawn and
//!   emergency requests.
//! - [`runner`] -- The async run loop, [`run_simulation`].
//!
//! [`AgentEnv`]: burrow_agents::AgentEnv

pub mod config;
pub mod coordinator;
pub mod nodes;
pub mod operator;
pub mod runner;
pub mod shared;

pub use config::{ConfigError, SimulationConfig};
pub use coordinator::{Coordinator, CoordinatorError, TickSummary};
pub use nodes::{NodeTable, ResourceNode};
pub use operator::{OperatorState, SimulationEndReason};
pub use runner::{RunnerError, SimulationResult, TickCallback, run_simulation};
pub use shared::SharedWorld;
