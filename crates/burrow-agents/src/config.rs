//! Per-kind tunables handed to the machine builder.
//!
//! The [`KindTuning`] struct bundles every number a kind's behaviors need so
//! that callers (the coordinator, tests) can override defaults. The
//! coordinator builds one per kind from the YAML configuration.

use burrow_types::WorldPoint;

/// Tunables for one agent kind.
#[derive(Debug, Clone, PartialEq)]
pub struct KindTuning {
    /// Travel speed in world units per second (default: 4.0).
    pub speed: f32,

    /// Where miners drop ore and haulers pick up supplies.
    pub home: WorldPoint,

    /// Where agents wait out an emergency.
    pub shelter: WorldPoint,

    /// Seconds between extraction attempts (default: 1.0).
    pub extract_interval: f32,

    /// Seconds between meal attempts (default: 1.0).
    pub consume_interval: f32,

    /// Units a miner carries before heading home (default: 15).
    pub max_carry: u32,

    /// Successful extractions between meals (default: 5).
    pub actions_per_food: u32,

    /// Seconds spent loading supplies (default: 1.0).
    pub load_duration: f32,

    /// Seconds spent handing units over (default: 1.0).
    pub deposit_duration: f32,

    /// Units a hauler loads per trip (default: 10).
    pub load_amount: u32,

    /// Steer with the decision policy while idle instead of standing still
    /// (default: false).
    pub roam_when_idle: bool,
}

impl Default for KindTuning {
    fn default() -> Self {
        Self {
            speed: 4.0,
            home: WorldPoint::ZERO,
            shelter: WorldPoint::ZERO,
            extract_interval: 1.0,
            consume_interval: 1.0,
            max_carry: 15,
            actions_per_food: 5,
            load_duration: 1.0,
            deposit_duration: 1.0,
            load_amount: 10,
            roam_when_idle: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tuning_values() {
        let t = KindTuning::default();
        assert_eq!(t.max_carry, 15);
        assert_eq!(t.actions_per_food, 5);
        assert_eq!(t.load_amount, 10);
        assert!(!t.roam_when_idle);
    }
}
