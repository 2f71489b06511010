//! Walk a planned route.
//!
//! The route is planned once, on enter. Each tick moves the agent
//! `speed * dt` toward the next waypoint; once the agent is within one cell
//! diameter of a waypoint it snaps onto it and aims for the following one.
//! Reaching the last waypoint raises [`AgentFlag::NearTarget`].
//!
//! While a region route is being walked its POI is the body's heading.
//! Arriving at the end of the route turns the heading into a claim.

use burrow_types::{PoiId, WorldPoint};

use super::{AgentCx, AgentFlag};
use crate::body::AgentBody;
use crate::env::{AgentEnv, PathTarget};
use crate::fsm::StateBehavior;

/// Path-following behavior.
#[derive(Debug, Clone)]
pub struct FollowPath {
    target: PathTarget,
    speed: f32,
    waypoints: Vec<WorldPoint>,
    next: usize,
    poi: Option<PoiId>,
}

impl FollowPath {
    /// Follow routes to `target` at `speed` world units per second.
    pub const fn new(target: PathTarget, speed: f32) -> Self {
        Self {
            target,
            speed,
            waypoints: Vec::new(),
            next: 0,
            poi: None,
        }
    }

    /// Remaining waypoints, the next one first.
    pub fn remaining(&self) -> &[WorldPoint] {
        self.waypoints.get(self.next..).unwrap_or(&[])
    }

    fn arrive(&mut self, cx: &mut AgentCx<'_>) {
        if let Some(last) = self.waypoints.last() {
            cx.local.position = *last;
        }
        self.next = self.waypoints.len();
        cx.local.heading = None;
        if let Some(poi) = self.poi {
            cx.local.claimed = Some(poi);
        }
        cx.raise(AgentFlag::NearTarget);
    }
}

impl StateBehavior<AgentFlag, AgentBody, dyn AgentEnv> for FollowPath {
    fn on_enter(&mut self, cx: &mut AgentCx<'_>) {
        self.waypoints.clear();
        self.next = 0;
        self.poi = None;

        match cx.env.plan_route(cx.local.position, self.target) {
            Ok(route) => {
                self.waypoints = route.waypoints;
                self.poi = route.poi;
                cx.local.heading = route.poi;
                if self.waypoints.len() <= 1 {
                    self.arrive(cx);
                }
            }
            Err(e) => {
                tracing::debug!(target_kind = ?self.target, error = %e, "Route planning failed");
                cx.raise(AgentFlag::MoveFailed);
            }
        }
    }

    fn on_tick(&mut self, cx: &mut AgentCx<'_>, dt: f32) {
        let Some(&waypoint) = self.waypoints.get(self.next) else {
            return;
        };
        let position = cx.local.position.step_toward(waypoint, self.speed * dt);
        cx.local.position = position;
        if position.distance(waypoint) > cx.env.node_diameter() {
            return;
        }
        if self.next + 1 >= self.waypoints.len() {
            self.arrive(cx);
        } else {
            cx.local.position = waypoint;
            self.next += 1;
        }
    }

    fn on_exit(&mut self, cx: &mut AgentCx<'_>) {
        self.waypoints.clear();
        self.next = 0;
        cx.local.heading = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::env::RegionLayer;
    use crate::states::testing::FakeEnv;
    use crate::states::{AgentMachine, AgentState, Wait};

    fn machine(target: PathTarget) -> AgentMachine {
        let mut m = AgentMachine::new();
        m.add_state(AgentState::GoToNode, Box::new(FollowPath::new(target, 2.0)));
        m.add_state(AgentState::Extract, Box::new(Wait));
        m.add_state(AgentState::Idle, Box::new(Wait));
        m.set_transition(AgentState::GoToNode, AgentFlag::NearTarget, AgentState::Extract);
        m.set_transition(AgentState::GoToNode, AgentFlag::MoveFailed, AgentState::Idle);
        m
    }

    #[test]
    fn walks_waypoints_and_claims_region_poi() {
        let env = FakeEnv::new().with_route(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)], Some(PoiId(5)));
        let mut m = machine(PathTarget::Region(RegionLayer::Extraction));
        let mut body = AgentBody::at(WorldPoint::ZERO, 0);
        m.force_state(AgentState::GoToNode, &mut body, &env);

        let mut ticks = 0;
        while m.current() == Some(AgentState::GoToNode) && ticks < 20 {
            m.tick(&mut body, &env, 0.25);
            ticks += 1;
        }
        assert_eq!(m.current(), Some(AgentState::Extract));
        assert_eq!(body.position, WorldPoint::new(3.0, 0.0));
        assert_eq!(body.claimed, Some(PoiId(5)));
        assert_eq!(body.heading, None);
    }

    #[test]
    fn heading_is_set_while_travelling_and_cleared_on_exit() {
        let env = FakeEnv::new().with_route(&[(0.0, 0.0), (8.0, 0.0)], Some(PoiId(2)));
        let mut m = machine(PathTarget::Region(RegionLayer::Extraction));
        let mut body = AgentBody::at(WorldPoint::ZERO, 0);
        m.force_state(AgentState::GoToNode, &mut body, &env);
        m.tick(&mut body, &env, 0.25);
        assert_eq!(body.heading, Some(PoiId(2)));
        assert_eq!(body.claimed, None);

        m.force_state(AgentState::Idle, &mut body, &env);
        assert_eq!(body.heading, None);
        assert_eq!(body.claimed, None);
    }

    #[test]
    fn snaps_onto_intermediate_waypoints() {
        let env = FakeEnv::new().with_route(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)], None);
        let mut m = machine(PathTarget::Point(WorldPoint::new(5.0, 5.0)));
        let mut body = AgentBody::at(WorldPoint::ZERO, 0);
        m.force_state(AgentState::GoToNode, &mut body, &env);

        // 1.2 units per tick: the fifth tick lands 0.2 short of the corner.
        for _ in 0..5 {
            m.tick(&mut body, &env, 0.6);
        }
        assert_eq!(body.position, WorldPoint::new(5.0, 0.0));
        assert_eq!(m.current(), Some(AgentState::GoToNode));

        m.tick(&mut body, &env, 0.6);
        assert!((body.position.x - 5.0).abs() < 1e-4);
        assert!((body.position.y - 1.2).abs() < 1e-4);
    }

    #[test]
    fn single_waypoint_route_arrives_on_enter() {
        let env = FakeEnv::new().with_route(&[(4.0, 4.0)], None);
        let mut m = machine(PathTarget::Point(WorldPoint::new(4.0, 4.0)));
        let mut body = AgentBody::at(WorldPoint::new(4.2, 4.1), 0);
        let applied = m.force_state(AgentState::GoToNode, &mut body, &env);
        assert_eq!(applied.len(), 1);
        assert_eq!(m.current(), Some(AgentState::Extract));
        assert_eq!(body.claimed, None);
    }

    #[test]
    fn planning_failure_raises_move_failed() {
        let env = FakeEnv::new();
        let mut m = machine(PathTarget::Region(RegionLayer::Supply));
        let mut body = AgentBody::default();
        m.force_state(AgentState::GoToNode, &mut body, &env);
        assert_eq!(m.current(), Some(AgentState::Idle));
    }

    #[test]
    fn movement_is_bounded_by_speed() {
        let env = FakeEnv::new().with_route(&[(0.0, 0.0), (10.0, 0.0)], None);
        let mut m = machine(PathTarget::Point(WorldPoint::new(10.0, 0.0)));
        let mut body = AgentBody::default();
        m.force_state(AgentState::GoToNode, &mut body, &env);
        // The first tick only consumes the start waypoint.
        for _ in 0..3 {
            m.tick(&mut body, &env, 0.5);
        }
        assert!((body.position.x - 2.0).abs() < 1e-4);
        assert_eq!(m.current(), Some(AgentState::GoToNode));
    }
}
