//! The agent economy coordinator.
//!
//! [`Coordinator`] owns the agents and the [`SharedWorld`] they read. One
//! call to [`Coordinator::tick`] runs a full step:
//!
//! 1. **Agents** -- every agent's machine ticks on the rayon pool against
//!    `&SharedWorld`. Node mutations happen inside per-node locks.
//! 2. **Events** -- stockpile and delivery events from the agents' outboxes
//!    are applied.
//! 3. **Depletions** -- nodes emptied during the parallel phase leave both
//!    partitions; agents holding or walking toward them are told, then
//!    map-dependent agents; when no node is left every agent is parked in
//!    its idle state.
//! 4. **Spawning** -- per-kind spawn timers advance and may add agents,
//!    until no node is left.
//! 5. **In-use check** -- on its own interval, the nodes currently claimed
//!    by miners become the active set of the supply partition and
//!    map-dependent agents are told the map changed.
//!
//! The emergency toggle forces every agent into its evacuation state and
//! back, outside the tick.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use burrow_agents::{
    Agent, AgentError, AgentEvent, AgentFlag, DecisionPolicy, KindTuning, RegionLayer,
};
use burrow_types::{AgentId, AgentKind, GridCoord, PoiId, WorldPoint};
use burrow_world::{PartitionSnapshot, PathGrid, PointOfInterest, RegionPartition, WorldError, snapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::nodes::{NodeTable, ResourceNode};
use crate::shared::SharedWorld;

/// Errors from coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Grid or partition construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// An agent operation was rejected.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },
}

/// What happened during one [`Coordinator::tick`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Agents alive after the tick.
    pub agents: usize,
    /// State transitions applied across all agents.
    pub transitions: usize,
    /// Agents spawned by the spawn timers.
    pub spawned: usize,
    /// Nodes that ran dry this tick.
    pub depleted: Vec<PoiId>,
    /// Nodes still holding primary units.
    pub active_nodes: usize,
    /// Primary units handed in so far.
    pub stockpile: u64,
    /// Secondary units delivered this tick.
    pub delivered: u32,
    /// Whether the supply partition was refreshed this tick.
    pub map_refreshed: bool,
    /// Whether an emergency is in force.
    pub emergency: bool,
}

#[derive(Debug, Clone, Copy)]
struct SpawnTimer {
    cap: u32,
    interval: f32,
    elapsed: f32,
}

impl SpawnTimer {
    /// A timer that fires on the first advance. A non-positive interval
    /// disables automatic spawning.
    const fn new(cap: u32, interval: f32) -> Self {
        Self {
            cap,
            interval,
            elapsed: interval,
        }
    }

    fn advance(&mut self, dt: f32) -> bool {
        if self.interval <= 0.0 {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
            return true;
        }
        false
    }
}

/// Owns the agents and the shared world and drives both.
pub struct Coordinator {
    world: SharedWorld,
    agents: Vec<Agent>,
    tunings: BTreeMap<AgentKind, KindTuning>,
    spawners: BTreeMap<AgentKind, SpawnTimer>,
    in_use_interval: f32,
    in_use_elapsed: f32,
    spawn_jitter: f32,
    rng: StdRng,
    emergency: bool,
    stockpile: u64,
    tick: u64,
}

impl Coordinator {
    /// Build the grid from the configuration and compute both partitions
    /// from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::World`] if the grid is invalid or a node
    /// lies outside it.
    pub fn new(config: &SimulationConfig, policy: Arc<dyn DecisionPolicy>) -> Result<Self, CoordinatorError> {
        let grid = config.world.build_grid()?;
        Self::assemble(grid, config, policy, None)
    }

    /// Use a prebuilt grid instead of sampling the configured layout.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::World`] if a node lies outside the grid.
    pub fn with_grid(
        grid: PathGrid,
        config: &SimulationConfig,
        policy: Arc<dyn DecisionPolicy>,
    ) -> Result<Self, CoordinatorError> {
        Self::assemble(grid, config, policy, None)
    }

    /// Build from the configuration, reusing the costs in `snapshot` when it
    /// was taken over the same grid and nodes. A mismatched snapshot is
    /// ignored and the partitions are computed from scratch.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::new`].
    pub fn restore(
        config: &SimulationConfig,
        policy: Arc<dyn DecisionPolicy>,
        snapshot: PartitionSnapshot,
    ) -> Result<Self, CoordinatorError> {
        let grid = config.world.build_grid()?;
        Self::assemble(grid, config, policy, Some(snapshot))
    }

    fn assemble(
        grid: PathGrid,
        config: &SimulationConfig,
        policy: Arc<dyn DecisionPolicy>,
        cached: Option<PartitionSnapshot>,
    ) -> Result<Self, CoordinatorError> {
        let pois: Vec<PointOfInterest> = (0_u32..)
            .zip(&config.nodes)
            .map(|(id, node)| PointOfInterest {
                id: PoiId(id),
                cell: node.cell,
            })
            .collect();

        let grid = Arc::new(grid);
        let extraction = match cached {
            Some(snapshot) if snapshot.grid == *grid && snapshot.pois == pois => {
                RegionPartition::from_cache(Arc::clone(&grid), pois.iter().copied(), snapshot.cache)?
            }
            Some(snapshot) => {
                warn!(
                    saved_at = %snapshot.saved_at,
                    "Cached partition does not match the configured world, recomputing"
                );
                build_partition(&grid, &pois)?
            }
            None => build_partition(&grid, &pois)?,
        };
        // Same grid and POIs, so the supply layer starts from the same costs.
        let supply = extraction.clone();

        let nodes = NodeTable::new();
        for (poi, node) in pois.iter().zip(&config.nodes) {
            nodes.insert(ResourceNode::new(poi.id, poi.cell, node.primary, node.secondary));
        }

        let mut tunings = BTreeMap::new();
        let mut spawners = BTreeMap::new();
        for kind in AgentKind::ALL {
            tunings.insert(kind, config.tuning(kind));
            spawners.insert(
                kind,
                SpawnTimer::new(config.max_agents(kind), config.spawn_interval(kind)),
            );
        }

        let in_use_interval = config.economy.in_use_check_interval;
        info!(
            cells = grid.len(),
            width = grid.width(),
            height = grid.height(),
            nodes = pois.len(),
            "Coordinator ready"
        );

        Ok(Self {
            world: SharedWorld::new(grid, extraction, supply, nodes, policy),
            agents: Vec::new(),
            tunings,
            spawners,
            in_use_interval,
            // The first check runs one second in, once agents have moved.
            in_use_elapsed: (in_use_interval - 1.0).max(0.0),
            spawn_jitter: config.economy.spawn_jitter,
            rng: StdRng::seed_from_u64(config.world.seed),
            emergency: false,
            stockpile: 0,
            tick: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Control surface
    // -----------------------------------------------------------------------

    /// Spawn an agent of `kind` at home and force its initial state.
    ///
    /// An agent spawned once every node is exhausted is parked at once; one
    /// spawned during an emergency starts evacuating.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::SpawnCapReached`] when the kind is at its cap.
    pub fn spawn_agent(&mut self, kind: AgentKind) -> Result<AgentId, CoordinatorError> {
        let cap = self.spawners.get(&kind).map_or(0, |s| s.cap);
        if self.count(kind) >= cap as usize {
            return Err(AgentError::SpawnCapReached { kind, cap }.into());
        }
        let tuning = self.tunings.get(&kind).cloned().unwrap_or_default();
        let position = self.jittered(tuning.home);
        let (mut agent, _) = Agent::spawn(kind, &tuning, position, &self.world);
        if self.world.nodes().active_ids().is_empty() {
            agent.park(&self.world);
        } else if self.emergency {
            agent.begin_emergency(&self.world);
        }
        let id = agent.id();
        info!(agent_id = %id, kind = %kind, state = ?agent.state(), "Agent spawned");
        self.agents.push(agent);
        Ok(id)
    }

    /// Start or clear the emergency. Returns how many agents changed course.
    ///
    /// Starting it remembers each agent's coarse state and forces its
    /// evacuation state; clearing it forces the remembered states back.
    pub fn set_emergency(&mut self, on: bool) -> usize {
        if self.emergency == on {
            return 0;
        }
        self.emergency = on;
        let world = &self.world;
        let changed = self
            .agents
            .iter_mut()
            .map(|agent| {
                if on {
                    agent.begin_emergency(world)
                } else {
                    agent.end_emergency(world)
                }
            })
            .filter(|changed| *changed)
            .count();
        info!(emergency = on, agents = changed, "Emergency toggled");
        changed
    }

    /// Advance the economy by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickSummary {
        self.tick = self.tick.saturating_add(1);
        let world = &self.world;
        let transitions: usize = self
            .agents
            .par_iter_mut()
            .map(|agent| agent.tick(world, dt).len())
            .sum();

        let delivered = self.settle_events();
        let depleted = self.settle_depletions();
        let spawned = self.advance_spawners(dt);
        let map_refreshed = self.advance_in_use_check(dt);

        let summary = TickSummary {
            tick: self.tick,
            agents: self.agents.len(),
            transitions,
            spawned,
            depleted,
            active_nodes: self.world.nodes().active_ids().len(),
            stockpile: self.stockpile,
            delivered,
            map_refreshed,
            emergency: self.emergency,
        };
        debug!(
            tick = summary.tick,
            agents = summary.agents,
            transitions = summary.transitions,
            active_nodes = summary.active_nodes,
            stockpile = summary.stockpile,
            "Tick complete"
        );
        summary
    }

    /// Remove an agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnknownAgent`] if no agent has this id.
    pub fn remove_agent(&mut self, id: AgentId) -> Result<Agent, CoordinatorError> {
        let index = self
            .agents
            .iter()
            .position(|agent| agent.id() == id)
            .ok_or(AgentError::UnknownAgent(id))?;
        let agent = self.agents.remove(index);
        debug!(agent_id = %id, "Agent removed");
        Ok(agent)
    }

    /// Encode the extraction partition for the cost cache.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::World`] if encoding fails.
    pub fn save_partition(&self) -> Result<Vec<u8>, CoordinatorError> {
        let partition = self.world.partition(RegionLayer::Extraction).read();
        Ok(snapshot::save(&partition)?)
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// All agents, in spawn order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// One agent.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    /// Number of agents of `kind`.
    pub fn count(&self, kind: AgentKind) -> usize {
        self.agents.iter().filter(|agent| agent.kind() == kind).count()
    }

    /// A copy of one node.
    pub fn node(&self, id: PoiId) -> Option<ResourceNode> {
        self.world.nodes().get(id)
    }

    /// Copies of every node.
    pub fn nodes(&self) -> Vec<ResourceNode> {
        self.world.nodes().snapshot()
    }

    /// The shared world agents tick against.
    pub const fn world(&self) -> &SharedWorld {
        &self.world
    }

    /// The POI owning `cell` in a layer.
    pub fn region_of(&self, layer: RegionLayer, cell: GridCoord) -> Option<PoiId> {
        self.world.partition(layer).read().region_of(cell)
    }

    /// Active POIs of a layer, ascending.
    pub fn active_pois(&self, layer: RegionLayer) -> Vec<PoiId> {
        self.world.partition(layer).read().active_pois().collect()
    }

    /// Primary units handed in so far.
    pub const fn stockpile(&self) -> u64 {
        self.stockpile
    }

    /// Whether an emergency is in force.
    pub const fn is_emergency(&self) -> bool {
        self.emergency
    }

    /// Ticks run so far.
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    // -----------------------------------------------------------------------
    // Tick phases
    // -----------------------------------------------------------------------

    fn settle_events(&mut self) -> u32 {
        let mut delivered = 0_u32;
        for agent in &mut self.agents {
            for event in agent.drain_events() {
                match event {
                    AgentEvent::Stockpiled { amount } => {
                        self.stockpile = self.stockpile.saturating_add(u64::from(amount));
                    }
                    AgentEvent::Delivered { node, amount } => match self.world.nodes().deliver(node, amount) {
                        Ok(total) => {
                            delivered = delivered.saturating_add(amount);
                            debug!(node = %node, amount, total, "Supplies delivered");
                        }
                        Err(e) => debug!(node = %node, error = %e, "Delivery refused"),
                    },
                }
            }
        }
        delivered
    }

    fn settle_depletions(&mut self) -> Vec<PoiId> {
        let mut depleted = self.world.nodes().drain_depleted();
        depleted.dedup();
        if depleted.is_empty() {
            return depleted;
        }

        for &id in &depleted {
            self.world.partition(RegionLayer::Extraction).write().remove_poi(id);
            self.world.partition(RegionLayer::Supply).write().remove_poi(id);
            info!(node = %id, "Resource node depleted");

            let world = &self.world;
            for agent in &mut self.agents {
                agent.node_depleted(id, world);
            }
        }
        self.broadcast_map_updated();

        if self.world.nodes().active_ids().is_empty() {
            let world = &self.world;
            for agent in &mut self.agents {
                agent.park(world);
            }
            info!(agents = self.agents.len(), "No resource nodes remain, agents parked");
        }
        depleted
    }

    fn advance_spawners(&mut self, dt: f32) -> usize {
        if self.world.nodes().active_ids().is_empty() {
            return 0;
        }
        let due: Vec<AgentKind> = self
            .spawners
            .iter_mut()
            .filter_map(|(kind, timer)| timer.advance(dt).then_some(*kind))
            .collect();
        let mut spawned = 0;
        for kind in due {
            match self.spawn_agent(kind) {
                Ok(_) => spawned += 1,
                Err(e) => debug!(kind = %kind, error = %e, "Scheduled spawn skipped"),
            }
        }
        spawned
    }

    fn advance_in_use_check(&mut self, dt: f32) -> bool {
        if self.in_use_interval <= 0.0 {
            return false;
        }
        self.in_use_elapsed += dt;
        if self.in_use_elapsed < self.in_use_interval {
            return false;
        }
        self.in_use_elapsed = 0.0;

        let in_use: BTreeSet<PoiId> = self
            .agents
            .iter()
            .filter(|agent| agent.kind() == AgentKind::Miner)
            .filter_map(|agent| agent.body().claimed)
            .collect();
        let changed = self
            .world
            .partition(RegionLayer::Supply)
            .write()
            .update_active_pois(in_use.iter().copied());
        if changed {
            debug!(in_use = in_use.len(), "Supply partition refreshed");
        }
        self.broadcast_map_updated();
        true
    }

    fn broadcast_map_updated(&mut self) {
        let world = &self.world;
        for agent in self.agents.iter_mut().filter(|agent| agent.is_map_dependent()) {
            agent.raise(AgentFlag::MapUpdated, world);
        }
    }

    fn jittered(&mut self, point: WorldPoint) -> WorldPoint {
        if self.spawn_jitter <= 0.0 {
            return point;
        }
        let j = self.spawn_jitter;
        WorldPoint::new(
            point.x + self.rng.random_range(-j..=j),
            point.y + self.rng.random_range(-j..=j),
        )
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("world", &self.world)
            .field("agents", &self.agents.len())
            .field("emergency", &self.emergency)
            .field("stockpile", &self.stockpile)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

fn build_partition(grid: &Arc<PathGrid>, pois: &[PointOfInterest]) -> Result<RegionPartition, WorldError> {
    let mut partition = RegionPartition::new(Arc::clone(grid));
    partition.register_pois(pois.iter().copied())?;
    Ok(partition)
}
