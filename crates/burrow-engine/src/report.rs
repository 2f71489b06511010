//! Tick callback that reports progress through tracing.
//!
//! Depletions and emergency changes are logged as they happen; a status
//! line with the population and stockpile is logged every
//! `every` ticks. At debug level each tick summary is emitted as JSON.

use burrow_core::runner::TickCallback;
use burrow_core::{Coordinator, TickSummary};
use burrow_types::AgentKind;
use tracing::{debug, info, warn};

/// Logs what the coordinator did each tick.
pub struct ReportCallback {
    every: u64,
    emergency: bool,
}

impl ReportCallback {
    /// Report a status line every `every` ticks (0 disables status lines).
    pub const fn new(every: u64) -> Self {
        Self {
            every,
            emergency: false,
        }
    }
}

impl TickCallback for ReportCallback {
    fn on_tick(&mut self, summary: &TickSummary, coordinator: &Coordinator) {
        for poi in &summary.depleted {
            info!(tick = summary.tick, node = %poi, active_nodes = summary.active_nodes, "Node depleted");
        }

        if summary.emergency != self.emergency {
            self.emergency = summary.emergency;
            if summary.emergency {
                warn!(tick = summary.tick, agents = summary.agents, "Emergency raised");
            } else {
                info!(tick = summary.tick, "Emergency cleared");
            }
        }

        if self.every > 0 && summary.tick % self.every == 0 {
            info!(
                tick = summary.tick,
                miners = coordinator.count(AgentKind::Miner),
                haulers = coordinator.count(AgentKind::Hauler),
                active_nodes = summary.active_nodes,
                stockpile = summary.stockpile,
                "Status"
            );
        }

        match serde_json::to_string(summary) {
            Ok(json) => debug!(summary = %json, "Tick complete"),
            Err(e) => warn!(error = %e, "Failed to encode tick summary"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use burrow_agents::StubPolicy;
    use burrow_core::SimulationConfig;
    use burrow_core::config::NodeConfig;
    use burrow_types::GridCoord;

    use super::*;

    #[test]
    fn follows_emergency_changes() {
        let mut config = SimulationConfig::default();
        config.nodes = vec![NodeConfig {
            cell: GridCoord::new(3, 3),
            primary: 5,
            secondary: 5,
        }];
        config.miners.spawn_interval = 0.0;
        config.haulers.spawn_interval = 0.0;
        let mut c = Coordinator::new(&config, Arc::new(StubPolicy::new(3))).unwrap();
        let mut report = ReportCallback::new(1);

        c.set_emergency(true);
        let summary = c.tick(0.05);
        report.on_tick(&summary, &c);
        assert!(report.emergency);

        c.set_emergency(false);
        let summary = c.tick(0.05);
        report.on_tick(&summary, &c);
        assert!(!report.emergency);
    }
}
