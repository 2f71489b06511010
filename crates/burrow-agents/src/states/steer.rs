//! Policy-driven movement.
//!
//! Each tick the agent observes its offset to an anchor point and its load,
//! asks the environment's [`DecisionPolicy`](crate::policy::DecisionPolicy)
//! what to do, moves along the returned direction and raises the flags
//! whose outputs are set.

use burrow_types::WorldPoint;

use super::{AgentCx, AgentFlag};
use crate::body::AgentBody;
use crate::env::AgentEnv;
use crate::fsm::StateBehavior;
use crate::policy::PolicyDecision;

/// Steering behavior.
#[derive(Debug, Clone)]
pub struct Steer {
    anchor: WorldPoint,
    speed: f32,
    flag_outputs: Vec<AgentFlag>,
}

impl Steer {
    /// Steer around `anchor` at up to `speed` units per second. Flag output
    /// `i` of the policy raises `flag_outputs[i]`.
    pub const fn new(anchor: WorldPoint, speed: f32, flag_outputs: Vec<AgentFlag>) -> Self {
        Self {
            anchor,
            speed,
            flag_outputs,
        }
    }

    /// The observation vector: offset to the anchor, distance, load.
    pub fn features(&self, body: &AgentBody) -> [f32; 4] {
        let dx = self.anchor.x - body.position.x;
        let dy = self.anchor.y - body.position.y;
        [dx, dy, body.position.distance(self.anchor), body.carried as f32]
    }
}

impl StateBehavior<AgentFlag, AgentBody, dyn AgentEnv> for Steer {
    fn on_tick(&mut self, cx: &mut AgentCx<'_>, dt: f32) {
        let outputs = cx.env.policy().decide(&self.features(cx.local));
        let decision = PolicyDecision::from_outputs(&outputs);

        let (mut dx, mut dy) = decision.direction;
        let magnitude = dx.hypot(dy);
        if magnitude > 1.0 {
            dx /= magnitude;
            dy /= magnitude;
        }
        cx.local.position = cx.local.position.offset(dx, dy, self.speed * dt);

        for (index, flag) in self.flag_outputs.iter().enumerate() {
            if decision.flag(index) {
                cx.raise(*flag);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DecisionPolicy;
    use crate::states::testing::FakeEnv;
    use crate::states::{AgentMachine, AgentState, Wait};

    /// Always heads right at double speed and sets the first flag.
    struct Eastward;

    impl DecisionPolicy for Eastward {
        fn decide(&self, features: &[f32]) -> Vec<f32> {
            assert_eq!(features.len(), 4);
            vec![2.0, 0.0, 0.9]
        }
    }

    #[test]
    fn moves_along_clamped_direction_and_raises_flags() {
        let mut env = FakeEnv::new();
        env.policy = Box::new(Eastward);
        let mut m = AgentMachine::new();
        m.add_state(
            AgentState::Idle,
            Box::new(Steer::new(WorldPoint::ZERO, 1.0, vec![AgentFlag::MapUpdated])),
        );
        m.add_state(AgentState::GoToNode, Box::new(Wait));
        m.set_transition(AgentState::Idle, AgentFlag::MapUpdated, AgentState::GoToNode);

        let mut body = AgentBody::default();
        m.force_state(AgentState::Idle, &mut body, &env);
        let applied = m.tick(&mut body, &env, 0.5);

        assert!((body.position.x - 0.5).abs() < 1e-5);
        assert_eq!(applied.len(), 1);
        assert_eq!(m.current(), Some(AgentState::GoToNode));
    }

    #[test]
    fn stub_policy_stands_still() {
        let env = FakeEnv::new();
        let mut m = AgentMachine::new();
        m.add_state(AgentState::Idle, Box::new(Steer::new(WorldPoint::new(3.0, 4.0), 1.0, Vec::new())));
        let mut body = AgentBody::default();
        m.force_state(AgentState::Idle, &mut body, &env);
        m.tick(&mut body, &env, 1.0);
        assert_eq!(body.position, WorldPoint::ZERO);
    }

    #[test]
    fn features_describe_anchor_offset() {
        let steer = Steer::new(WorldPoint::new(3.0, 4.0), 1.0, Vec::new());
        let body = AgentBody::at(WorldPoint::ZERO, 2);
        let f = steer.features(&body);
        assert!((f[2] - 5.0).abs() < 1e-5);
        assert!((f[3] - 2.0).abs() < 1e-5);
    }
}
