//! Simulation loop runner with operator controls.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives [`Coordinator::tick`] with support for:
//!
//! - **Bounded runs**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: the operator can halt and continue the loop
//! - **Variable tick speed**: the tick interval is adjustable at runtime
//! - **Emergency**: the operator's emergency flag is applied between ticks
//! - **Spawn requests**: queued spawns are applied between ticks
//! - **Exhaustion**: the run ends once every resource node is empty

use std::sync::Arc;

use burrow_agents::AgentError;
use tracing::{info, warn};

use crate::coordinator::{Coordinator, CoordinatorError, TickSummary};
use crate::operator::{OperatorState, SimulationEndReason};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A coordinator operation failed.
    #[error("coordinator error: {source}")]
    Coordinator {
        /// The underlying coordinator error.
        #[from]
        source: CoordinatorError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes.
    fn on_tick(&mut self, summary: &TickSummary, coordinator: &Coordinator);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _coordinator: &Coordinator) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// Each iteration waits out a pause, honors a stop request and the time
/// limit, applies the operator's emergency flag and queued spawns, ticks
/// the coordinator by `dt` simulated seconds, reports to `callback`, then
/// checks exhaustion and the tick limit before sleeping for the current
/// tick interval.
///
/// # Errors
///
/// Returns [`RunnerError`] if a coordinator operation fails for a reason
/// other than a spawn cap.
pub async fn run_simulation(
    coordinator: &mut Coordinator,
    operator: &Arc<OperatorState>,
    dt: f32,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;
    let had_nodes = !coordinator.nodes().is_empty();

    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        dt,
        "Simulation starting"
    );

    loop {
        // --- Check pause ---
        if operator.is_paused() {
            info!("Simulation paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Simulation resumed");
        }

        // --- Check stop request (before tick) ---
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            return finish(operator, SimulationEndReason::OperatorStop, last_summary, total_ticks).await;
        }

        // --- Check time limit (before tick) ---
        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            return finish(operator, SimulationEndReason::MaxRealTimeReached, last_summary, total_ticks).await;
        }

        // --- Apply operator requests ---
        coordinator.set_emergency(operator.emergency_requested());
        for kind in operator.drain_spawn_requests().await {
            match coordinator.spawn_agent(kind) {
                Ok(_) => {}
                Err(CoordinatorError::Agent {
                    source: e @ AgentError::SpawnCapReached { .. },
                }) => warn!(kind = %kind, error = %e, "Requested spawn rejected"),
                Err(e) => return Err(e.into()),
            }
        }

        // --- Execute tick ---
        let summary = coordinator.tick(dt);
        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary, coordinator);

        // --- Check exhaustion ---
        if had_nodes && summary.active_nodes == 0 {
            info!(tick = summary.tick, stockpile = summary.stockpile, "All resource nodes exhausted");
            return finish(operator, SimulationEndReason::NodesExhausted, Some(summary), total_ticks).await;
        }

        // --- Check tick limit (after tick) ---
        if operator.tick_limit_reached(summary.tick) {
            info!(tick = summary.tick, max_ticks = operator.max_ticks(), "Tick limit reached");
            return finish(operator, SimulationEndReason::MaxTicksReached, Some(summary), total_ticks).await;
        }

        last_summary = Some(summary);

        // --- Sleep for tick interval ---
        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

async fn finish(
    operator: &OperatorState,
    reason: SimulationEndReason,
    final_summary: Option<TickSummary>,
    total_ticks: u64,
) -> Result<SimulationResult, RunnerError> {
    operator.set_end_reason(reason).await;
    Ok(SimulationResult {
        end_reason: reason,
        final_summary,
        total_ticks,
    })
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            agents = summary.agents,
            active_nodes = summary.active_nodes,
            stockpile = summary.stockpile,
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use burrow_agents::StubPolicy;
    use burrow_types::{AgentKind, GridCoord, WorldPoint};

    use super::*;
    use crate::config::{NodeConfig, SimulationBoundsConfig, SimulationConfig};

    fn coordinator(primary: u32) -> Coordinator {
        let mut config = SimulationConfig::default();
        config.world.width = 8.0;
        config.world.height = 8.0;
        config.world.home = WorldPoint::new(-3.5, -3.5);
        config.nodes = vec![NodeConfig {
            cell: GridCoord::new(2, 0),
            primary,
            secondary: 10,
        }];
        config.miners.spawn_interval = 0.0;
        config.haulers.spawn_interval = 0.0;
        config.miners.speed = 20.0;
        config.miners.extract_interval = 0.1;
        config.economy.spawn_jitter = 0.0;
        Coordinator::new(&config, Arc::new(StubPolicy::new(3))).unwrap()
    }

    fn operator(max_ticks: u64) -> Arc<OperatorState> {
        Arc::new(OperatorState::new(&SimulationBoundsConfig {
            tick_interval_ms: 0,
            max_ticks,
            ..SimulationBoundsConfig::default()
        }))
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut c = coordinator(1000);
        let op = operator(5);
        let result = run_simulation(&mut c, &op, 0.1, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(op.end_reason().await, Some(SimulationEndReason::MaxTicksReached));
    }

    #[tokio::test]
    async fn operator_stop() {
        let mut c = coordinator(1000);
        let op = operator(0);
        op.request_stop();
        let result = run_simulation(&mut c, &op, 0.1, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
    }

    #[tokio::test]
    async fn requested_spawns_and_emergency_are_applied() {
        let mut c = coordinator(1000);
        let op = operator(1);
        op.request_spawn(AgentKind::Miner).await;
        op.set_emergency(true);
        let result = run_simulation(&mut c, &op, 0.1, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.total_ticks, 1);
        assert_eq!(c.count(AgentKind::Miner), 1);
        assert!(c.is_emergency());
    }

    #[tokio::test]
    async fn exhaustion_ends_the_run() {
        let mut c = coordinator(3);
        c.spawn_agent(AgentKind::Miner).unwrap();
        let op = operator(500);
        let result = run_simulation(&mut c, &op, 0.1, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::NodesExhausted);
        assert!(result.total_ticks < 500);
    }

    #[tokio::test]
    async fn tick_callback_is_called() {
        struct CountCallback {
            count: u64,
        }
        impl TickCallback for CountCallback {
            fn on_tick(&mut self, _summary: &TickSummary, _coordinator: &Coordinator) {
                self.count = self.count.saturating_add(1);
            }
        }

        let mut c = coordinator(1000);
        let op = operator(3);
        let mut cb = CountCallback { count: 0 };
        let _ = run_simulation(&mut c, &op, 0.1, &mut cb).await.unwrap();
        assert_eq!(cb.count, 3);
    }
}
