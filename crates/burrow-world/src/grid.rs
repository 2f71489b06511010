//! The path grid: a fixed rectangle of weighted, possibly blocked cells.
//!
//! A [`PathGrid`] is sampled once from the environment at construction.
//! Each cell records whether it is passable and the extra cost of stepping
//! onto it. The topology never changes afterwards, so a grid can be shared
//! read-only (behind an `Arc`) by any number of concurrent searches.
//!
//! # Coordinates
//!
//! The grid covers `world_size` units centered on `origin`. Cells are
//! `2 * node_radius` wide; cell `(0, 0)` sits at the minimum x/y corner.
//! World points outside the covered area clamp to the nearest edge cell.

use std::collections::BTreeMap;

use burrow_types::{GridCoord, WorldPoint};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// What a sampler reports for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// The cell cannot be entered.
    Blocked,
    /// The cell can be entered at an extra cost of `weight`.
    Open {
        /// Added to every step that ends on this cell.
        weight: u32,
    },
}

impl Terrain {
    /// Passable terrain with no extra cost.
    pub const CLEAR: Self = Self::Open { weight: 0 };
}

/// Samples the environment at a cell center.
///
/// Called exactly once per cell while the grid is built.
pub trait TerrainSampler {
    /// Report the terrain of the cell centered at `center` with the given
    /// radius.
    fn sample(&self, center: WorldPoint, radius: f32) -> Terrain;
}

impl<F> TerrainSampler for F
where
    F: Fn(WorldPoint, f32) -> Terrain,
{
    fn sample(&self, center: WorldPoint, radius: f32) -> Terrain {
        self(center, radius)
    }
}

/// The rectangle a grid covers and the size of its cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Center of the covered rectangle.
    pub origin: WorldPoint,
    /// Width of the covered rectangle in world units.
    pub width: f32,
    /// Height of the covered rectangle in world units.
    pub height: f32,
    /// Half the side length of a cell.
    pub node_radius: f32,
}

impl GridSpec {
    /// Side length of a cell.
    pub fn node_diameter(&self) -> f32 {
        self.node_radius * 2.0
    }

    /// Minimum x/y corner of the covered rectangle.
    pub fn bottom_left(&self) -> WorldPoint {
        WorldPoint::new(
            self.origin.x - self.width / 2.0,
            self.origin.y - self.height / 2.0,
        )
    }
}

/// A character map of terrain, one character per layout cell.
///
/// Rows are listed top to bottom (the first row is the maximum y edge) so
/// that a layout reads like a map. The layout is stretched over the grid's
/// covered rectangle, so it need not match the cell count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainLayout {
    rows: Vec<Vec<char>>,
    legend: BTreeMap<char, Terrain>,
    bounds: GridSpec,
}

impl TerrainLayout {
    /// Build a layout from text rows and a legend.
    ///
    /// Characters missing from the legend are treated as clear ground.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGrid`] if there are no rows or the rows
    /// differ in length.
    pub fn new<S: AsRef<str>>(
        rows: &[S],
        legend: BTreeMap<char, Terrain>,
        bounds: GridSpec,
    ) -> Result<Self, WorldError> {
        let rows: Vec<Vec<char>> = rows.iter().map(|r| r.as_ref().chars().collect()).collect();
        let Some(first) = rows.first() else {
            return Err(WorldError::InvalidGrid {
                reason: String::from("terrain layout has no rows"),
            });
        };
        let row_len = first.len();
        if row_len == 0 || rows.iter().any(|r| r.len() != row_len) {
            return Err(WorldError::InvalidGrid {
                reason: String::from("terrain layout rows must be non-empty and equal length"),
            });
        }
        Ok(Self {
            rows,
            legend,
            bounds,
        })
    }

    fn char_at(&self, point: WorldPoint) -> Option<char> {
        let cols = self.rows.first().map_or(0, Vec::len);
        let row_count = self.rows.len();
        let bl = self.bounds.bottom_left();
        let fx = ((point.x - bl.x) / self.bounds.width).clamp(0.0, 1.0);
        let fy = ((point.y - bl.y) / self.bounds.height).clamp(0.0, 1.0);
        let col = ((fx * cols as f32) as usize).min(cols.saturating_sub(1));
        let from_bottom = ((fy * row_count as f32) as usize).min(row_count.saturating_sub(1));
        let row = row_count.saturating_sub(1).saturating_sub(from_bottom);
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }
}

impl TerrainSampler for TerrainLayout {
    fn sample(&self, center: WorldPoint, _radius: f32) -> Terrain {
        self.char_at(center)
            .and_then(|c| self.legend.get(&c).copied())
            .unwrap_or(Terrain::CLEAR)
    }
}

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Position in the grid.
    pub coord: GridCoord,
    /// World position of the cell center.
    pub world: WorldPoint,
    /// Whether agents may enter the cell.
    pub passable: bool,
    /// Extra cost of stepping onto the cell.
    pub weight: u32,
}

/// The path grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGrid {
    spec: GridSpec,
    width: u32,
    height: u32,
    /// Row-major: index `y * width + x`.
    cells: Vec<Cell>,
}

impl PathGrid {
    /// Sample the rectangle described by `spec` into cells.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGrid`] if the radius or extent is not
    /// positive, or the extent is smaller than a single cell.
    pub fn build(spec: GridSpec, sampler: &impl TerrainSampler) -> Result<Self, WorldError> {
        if !(spec.node_radius > 0.0 && spec.width > 0.0 && spec.height > 0.0) {
            return Err(WorldError::InvalidGrid {
                reason: format!(
                    "extent {}x{} with node radius {} is not positive",
                    spec.width, spec.height, spec.node_radius
                ),
            });
        }
        let diameter = spec.node_diameter();
        let width = (spec.width / diameter).round() as u32;
        let height = (spec.height / diameter).round() as u32;
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidGrid {
                reason: format!("extent {}x{} holds no cell of diameter {diameter}", spec.width, spec.height),
            });
        }

        let bl = spec.bottom_left();
        let mut cells = Vec::with_capacity((width as usize).saturating_mul(height as usize));
        for y in 0..height {
            for x in 0..width {
                let world = WorldPoint::new(
                    (x as f32).mul_add(diameter, bl.x + spec.node_radius),
                    (y as f32).mul_add(diameter, bl.y + spec.node_radius),
                );
                let (passable, weight) = match sampler.sample(world, spec.node_radius) {
                    Terrain::Blocked => (false, 0),
                    Terrain::Open { weight } => (true, weight),
                };
                cells.push(Cell {
                    coord: GridCoord::new(x, y),
                    world,
                    passable,
                    weight,
                });
            }
        }

        tracing::debug!(width, height, node_diameter = diameter, "Path grid built");
        Ok(Self {
            spec,
            width,
            height,
            cells,
        })
    }

    /// Build a grid of unit cells whose terrain comes from a per-coordinate
    /// function. Cell `(x, y)` is centered at `(x + 0.5, y + 0.5)`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGrid`] if either dimension is zero.
    pub fn from_fn(
        width: u32,
        height: u32,
        terrain: impl Fn(GridCoord) -> Terrain,
    ) -> Result<Self, WorldError> {
        let spec = GridSpec {
            origin: WorldPoint::new(width as f32 / 2.0, height as f32 / 2.0),
            width: width as f32,
            height: height as f32,
            node_radius: 0.5,
        };
        Self::build(spec, &|center: WorldPoint, _radius: f32| {
            terrain(GridCoord::new(center.x.floor() as u32, center.y.floor() as u32))
        })
    }

    /// Build an all-passable grid of unit cells with the same weight.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGrid`] if either dimension is zero.
    pub fn uniform(width: u32, height: u32, weight: u32) -> Result<Self, WorldError> {
        Self::from_fn(width, height, |_| Terrain::Open { weight })
    }

    /// The extent and cell size the grid was sampled from.
    pub const fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Number of columns.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells (never true for a built grid).
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Side length of a cell in world units.
    pub fn node_diameter(&self) -> f32 {
        self.spec.node_diameter()
    }

    /// Whether the coordinate lies inside the grid.
    pub const fn contains(&self, coord: GridCoord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Row-major index of a coordinate, if it lies inside the grid.
    pub fn index_of(&self, coord: GridCoord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let row = (coord.y as usize).checked_mul(self.width as usize)?;
        row.checked_add(coord.x as usize)
    }

    /// Coordinate of a row-major index.
    pub fn coord_at(&self, index: usize) -> Option<GridCoord> {
        self.cells.get(index).map(|c| c.coord)
    }

    /// Look up a cell.
    pub fn cell(&self, coord: GridCoord) -> Option<&Cell> {
        self.index_of(coord).and_then(|i| self.cells.get(i))
    }

    /// Look up a cell, failing on coordinates outside the grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] for coordinates outside the grid.
    pub fn try_cell(&self, coord: GridCoord) -> Result<&Cell, WorldError> {
        self.cell(coord).ok_or(WorldError::OutOfBounds {
            cell: coord,
            width: self.width,
            height: self.height,
        })
    }

    /// Iterate over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Whether the cell exists and can be entered.
    pub fn is_passable(&self, coord: GridCoord) -> bool {
        self.cell(coord).is_some_and(|c| c.passable)
    }

    /// Extra cost of entering a cell (zero outside the grid).
    pub fn weight(&self, coord: GridCoord) -> u32 {
        self.cell(coord).map_or(0, |c| c.weight)
    }

    /// World position of a cell center. Coordinates outside the grid are
    /// clamped first.
    pub fn world_of(&self, coord: GridCoord) -> WorldPoint {
        let clamped = GridCoord::new(
            coord.x.min(self.width.saturating_sub(1)),
            coord.y.min(self.height.saturating_sub(1)),
        );
        self.cell(clamped).map_or(self.spec.origin, |c| c.world)
    }

    /// The cell containing a world point. Points outside the covered area
    /// clamp to the nearest edge cell; this never fails.
    pub fn cell_of(&self, point: WorldPoint) -> GridCoord {
        let bl = self.spec.bottom_left();
        let diameter = self.spec.node_diameter();
        let x = ((point.x - bl.x) / diameter).floor().max(0.0) as u32;
        let y = ((point.y - bl.y) / diameter).floor().max(0.0) as u32;
        GridCoord::new(x.min(self.width.saturating_sub(1)), y.min(self.height.saturating_sub(1)))
    }

    /// The up to eight in-bounds cells surrounding `coord` (no wraparound).
    /// Blocked neighbors are included; callers filter on passability.
    pub fn neighbors(&self, coord: GridCoord) -> Vec<GridCoord> {
        let mut result = Vec::with_capacity(8);
        for dy in -1_i64..=1 {
            for dx in -1_i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = i64::from(coord.x) + dx;
                let ny = i64::from(coord.y) + dy;
                if nx < 0 || ny < 0 || nx >= i64::from(self.width) || ny >= i64::from(self.height) {
                    continue;
                }
                result.push(GridCoord::new(nx as u32, ny as u32));
            }
        }
        result
    }
}
