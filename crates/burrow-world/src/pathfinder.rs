//! A* search over the 8-connected path grid.
//!
//! Step cost is [`AXIS_STEP`] for horizontal/vertical moves and
//! [`DIAGONAL_STEP`] for diagonal moves, plus the weight of the cell being
//! entered. The heuristic is the octile distance with the same step costs,
//! which never overestimates because weights are non-negative.
//!
//! All per-search scratch (`g`, parent links, closed set) lives in vectors
//! owned by one call, so any number of searches can share one `&PathGrid`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use burrow_types::GridCoord;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::grid::PathGrid;

/// Cost of a horizontal or vertical step.
pub const AXIS_STEP: u32 = 10;

/// Cost of a diagonal step (fixed-point approximation of `10 * sqrt(2)`).
pub const DIAGONAL_STEP: u32 = 14;

/// A route through the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPath {
    /// Cells from start to goal, both inclusive.
    pub cells: Vec<GridCoord>,
    /// Total weighted cost of the route.
    pub cost: u32,
}

impl GridPath {
    /// Number of cells in the route.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the route has no cells (never true for a found path).
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// A single-cell route means the start already is the goal.
    pub fn is_arrived(&self) -> bool {
        self.cells.len() == 1
    }

    /// Final cell of the route.
    pub fn goal(&self) -> Option<GridCoord> {
        self.cells.last().copied()
    }
}

/// Octile distance between two cells.
pub const fn octile(a: GridCoord, b: GridCoord) -> u32 {
    let (dx, dy) = a.axis_distance(b);
    let (short, long) = if dx < dy { (dx, dy) } else { (dy, dx) };
    DIAGONAL_STEP * short + AXIS_STEP * (long - short)
}

/// Cost of stepping from `from` onto the adjacent cell `to`.
fn step_cost(grid: &PathGrid, from: GridCoord, to: GridCoord) -> u32 {
    let base = if from.x != to.x && from.y != to.y {
        DIAGONAL_STEP
    } else {
        AXIS_STEP
    };
    base.saturating_add(grid.weight(to))
}

/// Frontier entry. `BinaryHeap` is a max-heap, so the ordering is reversed:
/// lowest `f` first, then lowest `h`, then earliest push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frontier {
    f: u32,
    h: u32,
    seq: u64,
    index: usize,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest path from `start` to `goal`.
///
/// A path to the start itself is a single cell with cost zero. An
/// impassable or out-of-bounds goal is never reached.
///
/// # Errors
///
/// Returns [`WorldError::PathNotFound`] when the frontier empties without
/// reaching the goal, and [`WorldError::OutOfBounds`] when the start lies
/// outside the grid.
pub fn find_path(grid: &PathGrid, start: GridCoord, goal: GridCoord) -> Result<GridPath, WorldError> {
    let start_index = grid.try_cell(start).map(|_| grid.index_of(start))?;
    let Some(start_index) = start_index else {
        return Err(WorldError::PathNotFound { from: start, to: goal });
    };
    if start == goal {
        return Ok(GridPath {
            cells: vec![start],
            cost: 0,
        });
    }
    let not_found = WorldError::PathNotFound { from: start, to: goal };
    let Some(goal_index) = grid.index_of(goal) else {
        return Err(not_found);
    };
    if !grid.is_passable(goal) {
        return Err(not_found);
    }

    let len = grid.len();
    let mut g = vec![u32::MAX; len];
    let mut parent: Vec<Option<usize>> = vec![None; len];
    let mut closed = vec![false; len];
    let mut open = BinaryHeap::new();
    let mut seq: u64 = 0;

    g[start_index] = 0;
    let h0 = octile(start, goal);
    open.push(Frontier {
        f: h0,
        h: h0,
        seq,
        index: start_index,
    });

    while let Some(Frontier { index, .. }) = open.pop() {
        if closed[index] {
            continue;
        }
        if index == goal_index {
            return Ok(GridPath {
                cells: trace(grid, &parent, goal_index),
                cost: g[goal_index],
            });
        }
        closed[index] = true;

        let Some(current) = grid.coord_at(index) else {
            continue;
        };
        for next in grid.neighbors(current) {
            if !grid.is_passable(next) {
                continue;
            }
            let Some(next_index) = grid.index_of(next) else {
                continue;
            };
            if closed[next_index] {
                continue;
            }
            let tentative = g[index].saturating_add(step_cost(grid, current, next));
            if tentative < g[next_index] {
                g[next_index] = tentative;
                parent[next_index] = Some(index);
                let h = octile(next, goal);
                seq += 1;
                open.push(Frontier {
                    f: tentative.saturating_add(h),
                    h,
                    seq,
                    index: next_index,
                });
            }
        }
    }

    Err(not_found)
}

fn trace(grid: &PathGrid, parent: &[Option<usize>], goal_index: usize) -> Vec<GridCoord> {
    let mut cells = Vec::new();
    let mut cursor = Some(goal_index);
    while let Some(index) = cursor {
        if let Some(coord) = grid.coord_at(index) {
            cells.push(coord);
        }
        cursor = parent.get(index).copied().flatten();
    }
    cells.reverse();
    cells
}

/// Re-sum the cost of a cell sequence with the search's step rule.
///
/// Returns `None` if the sequence is empty, leaves the grid, enters an
/// impassable cell, or contains a step that is not a single neighbor move.
pub fn path_cost(grid: &PathGrid, cells: &[GridCoord]) -> Option<u32> {
    let first = cells.first()?;
    if !grid.contains(*first) {
        return None;
    }
    cells.windows(2).try_fold(0_u32, |total, pair| {
        let (from, to) = (pair[0], pair[1]);
        if !from.is_adjacent(to) || !grid.is_passable(to) {
            return None;
        }
        Some(total.saturating_add(step_cost(grid, from, to)))
    })
}
