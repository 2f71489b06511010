//! Extract primary units from the claimed node on a fixed interval.

use super::{AgentCx, AgentFlag};
use crate::body::AgentBody;
use crate::env::AgentEnv;
use crate::fsm::StateBehavior;

/// Extraction behavior.
///
/// The timer starts full, so the first attempt happens on the first tick.
/// A success adds one carried unit; at `max_carry` it raises
/// [`AgentFlag::InventoryFull`], otherwise every `actions_per_food`
/// successes it raises [`AgentFlag::Hungry`]. A failure raises
/// [`AgentFlag::ResourceEmpty`] and leaves the timer as it was.
#[derive(Debug, Clone)]
pub struct Extract {
    interval: f32,
    max_carry: u32,
    actions_per_food: u32,
    timer: f32,
}

impl Extract {
    /// Attempt once per `interval` seconds.
    pub const fn new(interval: f32, max_carry: u32, actions_per_food: u32) -> Self {
        Self {
            interval,
            max_carry,
            actions_per_food,
            timer: 0.0,
        }
    }
}

impl StateBehavior<AgentFlag, AgentBody, dyn AgentEnv> for Extract {
    fn on_enter(&mut self, _cx: &mut AgentCx<'_>) {
        self.timer = self.interval;
    }

    fn on_tick(&mut self, cx: &mut AgentCx<'_>, dt: f32) {
        self.timer += dt;
        if self.timer < self.interval {
            return;
        }

        let Some(node) = cx.local.claimed else {
            cx.raise(AgentFlag::ResourceEmpty);
            return;
        };
        if let Err(e) = cx.env.try_extract(node) {
            tracing::trace!(node = %node, error = %e, "Extraction failed");
            cx.raise(AgentFlag::ResourceEmpty);
            return;
        }

        self.timer = 0.0;
        let body = &mut *cx.local;
        body.carried = body.carried.saturating_add(1);
        body.extractions = body.extractions.saturating_add(1);

        if body.carried >= self.max_carry {
            body.extractions = 0;
            cx.raise(AgentFlag::InventoryFull);
        } else if self.actions_per_food > 0 && body.extractions % self.actions_per_food == 0 {
            cx.raise(AgentFlag::Hungry);
        }
    }
}
