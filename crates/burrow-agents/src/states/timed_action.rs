//! Wait a fixed time, then raise a flag.
//!
//! The completion effect (loading or handing over units) is applied on
//! exit, and only if the timer actually completed. An agent pulled out
//! early, by an emergency for example, keeps what it carries.

use super::{AgentCx, AgentFlag};
use crate::body::AgentBody;
use crate::env::{AgentEnv, AgentEvent};
use crate::fsm::StateBehavior;

/// What happens when a timed action completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Nothing beyond the flag.
    Nothing,
    /// Fill the inventory up to `amount` units.
    Load {
        /// Units carried afterwards.
        amount: u32,
    },
    /// Hand carried units in at home.
    Stockpile,
    /// Hand carried units to the claimed node.
    DeliverToClaim,
}

/// Timed action behavior.
#[derive(Debug, Clone)]
pub struct TimedAction {
    duration: f32,
    flag: AgentFlag,
    completion: Completion,
    elapsed: f32,
    completed: bool,
}

impl TimedAction {
    /// Raise `flag` after `duration` seconds and apply `completion` on exit.
    pub const fn new(duration: f32, flag: AgentFlag, completion: Completion) -> Self {
        Self {
            duration,
            flag,
            completion,
            elapsed: 0.0,
            completed: false,
        }
    }

    fn complete(&self, body: &mut AgentBody) {
        match self.completion {
            Completion::Nothing => {}
            Completion::Load { amount } => body.carried = body.carried.max(amount),
            Completion::Stockpile => {
                let amount = body.take_carried();
                if amount > 0 {
                    body.emit(AgentEvent::Stockpiled { amount });
                }
            }
            Completion::DeliverToClaim => {
                let Some(node) = body.claimed else {
                    tracing::debug!("Delivery finished without a claimed node");
                    return;
                };
                let amount = body.take_carried();
                if amount > 0 {
                    body.emit(AgentEvent::Delivered { node, amount });
                }
            }
        }
    }
}

impl StateBehavior<AgentFlag, AgentBody, dyn AgentEnv> for TimedAction {
    fn on_enter(&mut self, _cx: &mut AgentCx<'_>) {
        self.elapsed = 0.0;
        self.completed = false;
    }

    fn on_tick(&mut self, cx: &mut AgentCx<'_>, dt: f32) {
        if self.completed {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.completed = true;
            cx.raise(self.flag);
        }
    }

    fn on_exit(&mut self, cx: &mut AgentCx<'_>) {
        if self.completed {
            self.complete(cx.local);
        }
        self.completed = false;
    }
}
