//! Grid coordinates and continuous world positions.

use serde::{Deserialize, Serialize};

/// Integer coordinate of a cell in the path grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column, growing along the world x axis.
    pub x: u32,
    /// Row, growing along the world y axis.
    pub y: u32,
}

impl GridCoord {
    /// Create a coordinate.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Absolute per-axis distance to another coordinate.
    pub const fn axis_distance(self, other: Self) -> (u32, u32) {
        (self.x.abs_diff(other.x), self.y.abs_diff(other.y))
    }

    /// Whether `other` is one of the eight cells surrounding `self`.
    pub const fn is_adjacent(self, other: Self) -> bool {
        let (dx, dy) = self.axis_distance(other);
        dx <= 1 && dy <= 1 && (dx + dy) > 0
    }
}

impl core::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A point in continuous world space (the plane the grid is laid over).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl WorldPoint {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Self) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Move toward `target` by at most `step` units, never overshooting.
    #[must_use]
    pub fn step_toward(self, target: Self, step: f32) -> Self {
        let remaining = self.distance(target);
        if remaining <= step || remaining <= f32::EPSILON {
            return target;
        }
        let scale = step / remaining;
        Self {
            x: (target.x - self.x).mul_add(scale, self.x),
            y: (target.y - self.y).mul_add(scale, self.y),
        }
    }

    /// Translate by a direction vector scaled by `step`.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32, step: f32) -> Self {
        Self {
            x: dx.mul_add(step, self.x),
            y: dy.mul_add(step, self.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_covers_diagonals() {
        let c = GridCoord::new(3, 3);
        assert!(c.is_adjacent(GridCoord::new(4, 4)));
        assert!(c.is_adjacent(GridCoord::new(3, 2)));
        assert!(!c.is_adjacent(c));
        assert!(!c.is_adjacent(GridCoord::new(5, 3)));
    }

    #[test]
    fn step_toward_does_not_overshoot() {
        let a = WorldPoint::new(0.0, 0.0);
        let b = WorldPoint::new(3.0, 4.0);
        let mid = a.step_toward(b, 2.5);
        assert!((mid.distance(b) - 2.5).abs() < 1e-5);
        assert_eq!(a.step_toward(b, 10.0), b);
    }
}
