//! Decision policy trait and stub implementation.
//!
//! A [`DecisionPolicy`] is an opaque function from an observation vector to
//! an output vector. Whatever produces the weights (an evolved network, a
//! hand-written controller) lives outside this crate. The core reads the
//! outputs through [`PolicyDecision::from_outputs`]:
//!
//! - `outputs[0]`, `outputs[1]` -- movement direction (x, y)
//! - `outputs[2..]` -- boolean flags, set when the value exceeds
//!   [`FLAG_THRESHOLD`]
//!
//! Missing outputs read as zero.

/// Output value above which a flag output counts as set.
pub const FLAG_THRESHOLD: f32 = 0.5;

/// Maps observations to outputs. Must be deterministic for fixed weights.
pub trait DecisionPolicy: Send + Sync {
    /// Evaluate the policy.
    fn decide(&self, features: &[f32]) -> Vec<f32>;
}

/// Decoded policy outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDecision {
    /// Requested movement direction (not normalized).
    pub direction: (f32, f32),
    /// Flag outputs, in output order.
    pub flags: Vec<bool>,
}

impl PolicyDecision {
    /// Decode a raw output vector.
    pub fn from_outputs(outputs: &[f32]) -> Self {
        let at = |i: usize| outputs.get(i).copied().unwrap_or(0.0);
        Self {
            direction: (at(0), at(1)),
            flags: outputs.iter().skip(2).map(|v| *v > FLAG_THRESHOLD).collect(),
        }
    }

    /// Whether flag output `index` is set.
    pub fn flag(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }
}

/// A policy that always answers with zeros: no movement, no flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubPolicy {
    outputs: usize,
}

impl StubPolicy {
    /// A stub producing `outputs` zeros per call.
    pub const fn new(outputs: usize) -> Self {
        Self { outputs }
    }
}

impl DecisionPolicy for StubPolicy {
    fn decide(&self, _features: &[f32]) -> Vec<f32> {
        vec![0.0; self.outputs]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_split_into_direction_and_flags() {
        let decision = PolicyDecision::from_outputs(&[0.25, -1.0, 0.9, 0.5, 0.51]);
        assert!((decision.direction.0 - 0.25).abs() < f32::EPSILON);
        assert!((decision.direction.1 + 1.0).abs() < f32::EPSILON);
        assert_eq!(decision.flags, vec![true, false, true]);
        assert!(!decision.flag(7));
    }

    #[test]
    fn short_outputs_read_as_zero() {
        let decision = PolicyDecision::from_outputs(&[]);
        assert_eq!(decision.flags.len(), 0);
        assert!(decision.direction.0.abs() < f32::EPSILON);
    }

    #[test]
    fn stub_is_all_zero() {
        let stub = StubPolicy::new(4);
        let out = stub.decide(&[1.0, 2.0]);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|v| v.abs() < f32::EPSILON));
    }
}
