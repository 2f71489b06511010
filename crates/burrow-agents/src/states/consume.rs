//! Eat secondary units at the claimed node on a fixed interval.

use super::{AgentCx, AgentFlag};
use crate::body::AgentBody;
use crate::env::AgentEnv;
use crate::fsm::StateBehavior;

/// Consumption behavior. A failed attempt raises nothing and is retried
/// after another interval.
#[derive(Debug, Clone)]
pub struct Consume {
    interval: f32,
    timer: f32,
}

impl Consume {
    /// Attempt once per `interval` seconds.
    pub const fn new(interval: f32) -> Self {
        Self { interval, timer: 0.0 }
    }
}

impl StateBehavior<AgentFlag, AgentBody, dyn AgentEnv> for Consume {
    fn on_enter(&mut self, _cx: &mut AgentCx<'_>) {
        self.timer = 0.0;
    }

    fn on_tick(&mut self, cx: &mut AgentCx<'_>, dt: f32) {
        self.timer += dt;
        if self.timer < self.interval {
            return;
        }
        self.timer = 0.0;

        let Some(node) = cx.local.claimed else {
            return;
        };
        match cx.env.try_consume(node) {
            Ok(()) => cx.raise(AgentFlag::Consumed),
            Err(e) => tracing::trace!(node = %node, error = %e, "Nothing to eat, retrying"),
        }
    }
}
