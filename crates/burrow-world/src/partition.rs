//! Path-cost region partition.
//!
//! Every grid cell is assigned to the active point of interest (POI) that is
//! cheapest to reach from it, measured with the same A* cost the agents pay
//! when they walk. This is a discrete Voronoi diagram under path cost rather
//! than straight-line distance.
//!
//! # Cost cache
//!
//! The expensive part is one search per (cell, POI) pair. Those costs are
//! kept in a [`CostCache`] column per POI and survive activation changes, so
//! toggling which POIs are active only re-runs the per-cell argmin. A POI
//! that has never been seen costs one fresh search per cell, fanned out over
//! rayon's pool.
//!
//! # Assignment
//!
//! The argmin walks the active ids in ascending order and only replaces the
//! current best on a strictly lower cost, so equal costs go to the lowest id.
//! Unreachable costs never win; a cell that reaches no active POI is left
//! unassigned. Each recompute builds a fresh vector and swaps it in whole.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use burrow_types::{GridCoord, PoiId, WorldPoint};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::grid::PathGrid;
use crate::pathfinder::{GridPath, find_path};

/// A registered point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointOfInterest {
    /// Stable identity. Lower ids win cost ties.
    pub id: PoiId,
    /// The cell agents route to.
    pub cell: GridCoord,
}

/// Per-cell costs to one POI, indexed like the grid's cells. `None` marks a
/// cell from which the POI is unreachable.
pub type CostColumn = Vec<Option<u32>>;

/// Serialized form of one cache column.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheColumn {
    poi: PoiId,
    costs: CostColumn,
}

/// Cached path costs from every cell to each POI ever seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CacheColumn>", into = "Vec<CacheColumn>")]
pub struct CostCache {
    columns: BTreeMap<PoiId, CostColumn>,
}

impl From<Vec<CacheColumn>> for CostCache {
    fn from(columns: Vec<CacheColumn>) -> Self {
        Self {
            columns: columns.into_iter().map(|c| (c.poi, c.costs)).collect(),
        }
    }
}

impl From<CostCache> for Vec<CacheColumn> {
    fn from(cache: CostCache) -> Self {
        cache
            .columns
            .into_iter()
            .map(|(poi, costs)| CacheColumn { poi, costs })
            .collect()
    }
}

impl CostCache {
    /// Cost from the cell at `index` to `poi`, if cached and reachable.
    pub fn get(&self, index: usize, poi: PoiId) -> Option<u32> {
        self.columns.get(&poi).and_then(|c| c.get(index).copied().flatten())
    }

    /// The full column for a POI.
    pub fn column(&self, poi: PoiId) -> Option<&CostColumn> {
        self.columns.get(&poi)
    }

    /// Whether a column of the given length is cached for `poi`.
    pub fn has_column(&self, poi: PoiId, len: usize) -> bool {
        self.columns.get(&poi).is_some_and(|c| c.len() == len)
    }

    /// Store a column, replacing any previous one.
    pub fn insert(&mut self, poi: PoiId, column: CostColumn) {
        self.columns.insert(poi, column);
    }

    /// Drop a column.
    pub fn remove(&mut self, poi: PoiId) -> Option<CostColumn> {
        self.columns.remove(&poi)
    }

    /// Ids with a cached column.
    pub fn pois(&self) -> impl Iterator<Item = PoiId> + '_ {
        self.columns.keys().copied()
    }

    /// Number of cached columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column is cached.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One search per cell toward `target`, in parallel.
fn compute_column(grid: &PathGrid, target: GridCoord) -> CostColumn {
    (0..grid.len())
        .into_par_iter()
        .map(|index| {
            grid.coord_at(index)
                .and_then(|from| find_path(grid, from, target).ok())
                .map(|path| path.cost)
        })
        .collect()
}

/// Assignment of grid cells to their cheapest active POI.
#[derive(Debug, Clone)]
pub struct RegionPartition {
    grid: Arc<PathGrid>,
    pois: BTreeMap<PoiId, GridCoord>,
    active: BTreeSet<PoiId>,
    cache: CostCache,
    assignment: Vec<Option<PoiId>>,
}

impl RegionPartition {
    /// An empty partition over `grid`. Every cell starts unassigned.
    pub fn new(grid: Arc<PathGrid>) -> Self {
        let assignment = vec![None; grid.len()];
        Self {
            grid,
            pois: BTreeMap::new(),
            active: BTreeSet::new(),
            cache: CostCache::default(),
            assignment,
        }
    }

    /// Restore a partition from a previously computed cost cache.
    ///
    /// Cached columns matching the grid size are reused; only POIs without a
    /// usable column are searched. Every listed POI starts active.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicatePoi`] or [`WorldError::OutOfBounds`]
    /// for invalid POIs.
    pub fn from_cache(
        grid: Arc<PathGrid>,
        pois: impl IntoIterator<Item = PointOfInterest>,
        mut cache: CostCache,
    ) -> Result<Self, WorldError> {
        let pois: Vec<PointOfInterest> = pois.into_iter().collect();
        let keep: BTreeSet<PoiId> = pois.iter().map(|p| p.id).collect();
        let stale: Vec<PoiId> = cache.pois().filter(|id| !keep.contains(id)).collect();
        for id in stale {
            cache.remove(id);
        }
        let reused = pois.iter().filter(|p| cache.has_column(p.id, grid.len())).count();

        let mut partition = Self::new(grid);
        partition.cache = cache;
        partition.register_pois(pois)?;
        tracing::info!(
            pois = partition.pois.len(),
            reused_columns = reused,
            "Region partition restored from cost cache"
        );
        Ok(partition)
    }

    /// The grid the partition is computed over.
    pub const fn grid(&self) -> &Arc<PathGrid> {
        &self.grid
    }

    /// Register a single POI and make it active.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicatePoi`] if the id is already registered
    /// and [`WorldError::OutOfBounds`] if the cell is outside the grid.
    pub fn register_poi(&mut self, id: PoiId, cell: GridCoord) -> Result<(), WorldError> {
        self.register_pois([PointOfInterest { id, cell }])
    }

    /// Register several POIs, make them active, and recompute the
    /// assignment once at the end.
    ///
    /// Nothing is registered if any POI is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicatePoi`] for an id that is already
    /// registered (or repeated in the batch) and [`WorldError::OutOfBounds`]
    /// for a cell outside the grid.
    pub fn register_pois(
        &mut self,
        pois: impl IntoIterator<Item = PointOfInterest>,
    ) -> Result<(), WorldError> {
        let pois: Vec<PointOfInterest> = pois.into_iter().collect();
        let mut seen = BTreeSet::new();
        for poi in &pois {
            if self.pois.contains_key(&poi.id) || !seen.insert(poi.id) {
                return Err(WorldError::DuplicatePoi(poi.id));
            }
            self.grid.try_cell(poi.cell)?;
        }

        let started = Instant::now();
        let len = self.grid.len();
        let mut searched = 0_usize;
        for poi in &pois {
            if !self.cache.has_column(poi.id, len) {
                let column = compute_column(&self.grid, poi.cell);
                self.cache.insert(poi.id, column);
                searched += 1;
            }
            self.pois.insert(poi.id, poi.cell);
            self.active.insert(poi.id);
        }
        if searched > 0 {
            tracing::debug!(
                searched,
                cells = len,
                elapsed_ms = started.elapsed().as_millis(),
                "Cost columns computed"
            );
        }
        self.reassign();
        Ok(())
    }

    /// Remove a POI, drop its cached costs and recompute the assignment.
    ///
    /// Returns `false` (and changes nothing) for an unknown id.
    pub fn remove_poi(&mut self, id: PoiId) -> bool {
        if self.pois.remove(&id).is_none() {
            return false;
        }
        self.active.remove(&id);
        self.cache.remove(id);
        self.reassign();
        tracing::debug!(poi = %id, remaining = self.pois.len(), "Point of interest removed");
        true
    }

    /// Replace the active subset. Ids that are not registered are ignored.
    ///
    /// Cached costs of deactivated POIs are kept, so reactivating them later
    /// runs no search. The assignment is recomputed only when the active set
    /// actually changed; the return value says whether it did.
    pub fn update_active_pois(&mut self, ids: impl IntoIterator<Item = PoiId>) -> bool {
        let next: BTreeSet<PoiId> = ids
            .into_iter()
            .filter(|id| self.pois.contains_key(id))
            .collect();
        if next == self.active {
            return false;
        }
        self.active = next;
        self.reassign();
        true
    }

    fn reassign(&mut self) {
        let started = Instant::now();
        let active: Vec<PoiId> = self.active.iter().copied().collect();
        let cache = &self.cache;
        let next: Vec<Option<PoiId>> = (0..self.grid.len())
            .into_par_iter()
            .map(|index| {
                let mut best: Option<(u32, PoiId)> = None;
                for &id in &active {
                    let Some(cost) = cache.get(index, id) else {
                        continue;
                    };
                    if best.is_none_or(|(best_cost, _)| cost < best_cost) {
                        best = Some((cost, id));
                    }
                }
                best.map(|(_, id)| id)
            })
            .collect();
        self.assignment = next;
        tracing::debug!(
            active = active.len(),
            cells = self.assignment.len(),
            elapsed_us = started.elapsed().as_micros(),
            "Region assignment recomputed"
        );
    }

    /// The POI whose region contains `cell`.
    ///
    /// `None` if no POI is active, the cell reaches none of them, or the
    /// cell is outside the grid.
    pub fn region_of(&self, cell: GridCoord) -> Option<PoiId> {
        self.grid
            .index_of(cell)
            .and_then(|i| self.assignment.get(i).copied().flatten())
    }

    /// The POI whose region contains the cell under a world point.
    pub fn region_of_point(&self, point: WorldPoint) -> Option<PoiId> {
        self.region_of(self.grid.cell_of(point))
    }

    /// Cell of a registered POI.
    pub fn poi_cell(&self, id: PoiId) -> Option<GridCoord> {
        self.pois.get(&id).copied()
    }

    /// Active POI ids in ascending order.
    pub fn active_pois(&self) -> impl Iterator<Item = PoiId> + '_ {
        self.active.iter().copied()
    }

    /// Whether the POI is registered and active.
    pub fn is_active(&self, id: PoiId) -> bool {
        self.active.contains(&id)
    }

    /// All registered POIs in id order, active or not.
    pub fn registered(&self) -> impl Iterator<Item = PointOfInterest> + '_ {
        self.pois.iter().map(|(&id, &cell)| PointOfInterest { id, cell })
    }

    /// Cached cost from `cell` to `id`, if known and reachable.
    pub fn cached_cost(&self, cell: GridCoord, id: PoiId) -> Option<u32> {
        self.grid.index_of(cell).and_then(|i| self.cache.get(i, id))
    }

    /// The cost cache, for persistence.
    pub const fn cache(&self) -> &CostCache {
        &self.cache
    }

    /// The current assignment, indexed like the grid's cells.
    pub fn assignment(&self) -> &[Option<PoiId>] {
        &self.assignment
    }

    /// Resolve the region under `from` and search a path to its POI.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoActivePoi`] when nothing is active,
    /// [`WorldError::Unassigned`] when the cell reaches no active POI, and
    /// [`WorldError::PathNotFound`] if the search fails.
    pub fn route_to_region(&self, from: WorldPoint) -> Result<(PoiId, GridPath), WorldError> {
        if self.active.is_empty() {
            return Err(WorldError::NoActivePoi);
        }
        let cell = self.grid.cell_of(from);
        let id = self.region_of(cell).ok_or(WorldError::Unassigned(cell))?;
        let goal = self.poi_cell(id).ok_or(WorldError::UnknownPoi(id))?;
        let path = find_path(&self.grid, cell, goal)?;
        Ok((id, path))
    }

    /// Path from `from` to the POI of the region it lies in.
    ///
    /// # Errors
    ///
    /// See [`RegionPartition::route_to_region`].
    pub fn find_path_to_region(&self, from: WorldPoint) -> Result<GridPath, WorldError> {
        self.route_to_region(from).map(|(_, path)| path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::grid::Terrain;

    fn poi(id: u32, x: u32, y: u32) -> PointOfInterest {
        PointOfInterest {
            id: PoiId(id),
            cell: GridCoord::new(x, y),
        }
    }

    /// Argmin over fresh searches, independent of the cache.
    fn brute_force(grid: &PathGrid, pois: &[PointOfInterest]) -> Vec<Option<PoiId>> {
        let mut sorted = pois.to_vec();
        sorted.sort_by_key(|p| p.id);
        grid.cells()
            .map(|cell| {
                let mut best: Option<(u32, PoiId)> = None;
                for p in &sorted {
                    if let Ok(path) = find_path(grid, cell.coord, p.cell) {
                        if best.is_none_or(|(c, _)| path.cost < c) {
                            best = Some((path.cost, p.id));
                        }
                    }
                }
                best.map(|(_, id)| id)
            })
            .collect()
    }

    fn terrain_grid() -> Arc<PathGrid> {
        Arc::new(
            PathGrid::from_fn(9, 7, |c| match (c.x, c.y) {
                (4, y) if y > 1 => Terrain::Blocked,
                (x, _) if x > 5 => Terrain::Open { weight: 3 },
                _ => Terrain::CLEAR,
            })
            .unwrap(),
        )
    }

    #[test]
    fn empty_partition_has_no_region() {
        let partition = RegionPartition::new(Arc::new(PathGrid::uniform(4, 4, 0).unwrap()));
        assert_eq!(partition.region_of(GridCoord::new(1, 1)), None);
        let result = partition.find_path_to_region(WorldPoint::new(1.5, 1.5));
        assert!(matches!(result, Err(WorldError::NoActivePoi)));
    }

    #[test]
    fn single_poi_owns_every_cell() {
        let mut partition = RegionPartition::new(Arc::new(PathGrid::uniform(10, 10, 0).unwrap()));
        partition.register_poi(PoiId(0), GridCoord::new(9, 9)).unwrap();
        assert!(partition.assignment().iter().all(|r| *r == Some(PoiId(0))));
        let path = partition.find_path_to_region(WorldPoint::new(0.5, 0.5)).unwrap();
        assert_eq!(path.cost, 126);
        assert_eq!(path.len(), 10);
    }

    #[test]
    fn assignment_follows_path_cost_not_distance() {
        // A heavy ring around (0, 0) makes (4, 4) cheaper to reach from (9, 9)
        // even though (0, 0) is closer in a straight line.
        let weighted = PathGrid::from_fn(10, 10, |c| {
            if c.x.max(c.y) == 2 { Terrain::Open { weight: 100 } } else { Terrain::CLEAR }
        })
        .unwrap();
        let plain = PathGrid::uniform(10, 10, 0).unwrap();
        let pois = [poi(0, 0, 0), poi(1, 9, 9)];

        let mut plain_partition = RegionPartition::new(Arc::new(plain));
        plain_partition.register_pois(pois).unwrap();
        assert_eq!(plain_partition.region_of(GridCoord::new(4, 4)), Some(PoiId(0)));

        let mut weighted_partition = RegionPartition::new(Arc::new(weighted));
        weighted_partition.register_pois(pois).unwrap();
        assert_eq!(weighted_partition.region_of(GridCoord::new(4, 4)), Some(PoiId(1)));
    }

    #[test]
    fn ties_go_to_lowest_id() {
        // (2, 0) is 20 away from both (0, 0) and (4, 0).
        let mut partition = RegionPartition::new(Arc::new(PathGrid::uniform(5, 1, 0).unwrap()));
        partition.register_pois([poi(7, 4, 0), poi(3, 0, 0)]).unwrap();
        assert_eq!(partition.region_of(GridCoord::new(2, 0)), Some(PoiId(3)));
    }

    #[test]
    fn assignment_matches_brute_force_argmin() {
        let grid = terrain_grid();
        let pois = [poi(0, 0, 0), poi(1, 8, 6), poi(2, 2, 6), poi(3, 7, 0)];
        let mut partition = RegionPartition::new(Arc::clone(&grid));
        partition.register_pois(pois).unwrap();
        assert_eq!(partition.assignment(), brute_force(&grid, &pois).as_slice());
    }

    #[test]
    fn incremental_removal_matches_full_build() {
        let grid = terrain_grid();
        let all = [poi(0, 0, 0), poi(1, 8, 6), poi(2, 2, 6), poi(3, 7, 0)];
        let mut incremental = RegionPartition::new(Arc::clone(&grid));
        incremental.register_pois(all).unwrap();
        assert!(incremental.remove_poi(PoiId(2)));
        assert!(incremental.cache().column(PoiId(2)).is_none());

        let survivors = [all[0], all[1], all[3]];
        let mut full = RegionPartition::new(Arc::clone(&grid));
        full.register_pois(survivors).unwrap();

        assert_eq!(incremental.assignment(), full.assignment());
        assert_eq!(incremental.assignment(), brute_force(&grid, &survivors).as_slice());
    }

    #[test]
    fn toggling_active_set_keeps_cache_and_matches_full_build() {
        let grid = terrain_grid();
        let all = [poi(0, 0, 0), poi(1, 8, 6), poi(2, 2, 6)];
        let mut partition = RegionPartition::new(Arc::clone(&grid));
        partition.register_pois(all).unwrap();

        assert!(partition.update_active_pois([PoiId(1), PoiId(99)]));
        assert!(!partition.update_active_pois([PoiId(1)]));
        assert_eq!(partition.active_pois().collect::<Vec<_>>(), vec![PoiId(1)]);
        assert_eq!(partition.cache().len(), 3);
        assert_eq!(partition.assignment(), brute_force(&grid, &[all[1]]).as_slice());

        assert!(partition.update_active_pois([PoiId(0), PoiId(1), PoiId(2)]));
        assert_eq!(partition.assignment(), brute_force(&grid, &all).as_slice());

        assert!(partition.update_active_pois(std::iter::empty()));
        assert!(partition.assignment().iter().all(Option::is_none));
    }

    #[test]
    fn disconnected_cells_stay_unassigned() {
        let grid = PathGrid::from_fn(5, 5, |c| if c.x == 2 { Terrain::Blocked } else { Terrain::CLEAR }).unwrap();
        let mut partition = RegionPartition::new(Arc::new(grid));
        partition.register_poi(PoiId(0), GridCoord::new(0, 0)).unwrap();
        assert_eq!(partition.region_of(GridCoord::new(1, 4)), Some(PoiId(0)));
        assert_eq!(partition.region_of(GridCoord::new(4, 4)), None);
        assert_eq!(partition.cached_cost(GridCoord::new(4, 4), PoiId(0)), None);
        let result = partition.find_path_to_region(WorldPoint::new(4.5, 4.5));
        assert!(matches!(result, Err(WorldError::Unassigned(_))));
    }

    #[test]
    fn duplicate_and_unknown_ids() {
        let mut partition = RegionPartition::new(Arc::new(PathGrid::uniform(3, 3, 0).unwrap()));
        partition.register_poi(PoiId(1), GridCoord::new(0, 0)).unwrap();
        let dup = partition.register_poi(PoiId(1), GridCoord::new(2, 2));
        assert!(matches!(dup, Err(WorldError::DuplicatePoi(PoiId(1)))));
        let oob = partition.register_poi(PoiId(2), GridCoord::new(5, 5));
        assert!(matches!(oob, Err(WorldError::OutOfBounds { .. })));
        assert!(!partition.remove_poi(PoiId(9)));
        assert_eq!(partition.registered().count(), 1);
    }

    #[test]
    fn restore_from_cache_reuses_columns() {
        let grid = terrain_grid();
        let pois = [poi(0, 0, 0), poi(1, 8, 6)];
        let mut built = RegionPartition::new(Arc::clone(&grid));
        built.register_pois(pois).unwrap();

        let restored = RegionPartition::from_cache(Arc::clone(&grid), pois, built.cache().clone()).unwrap();
        assert_eq!(restored.assignment(), built.assignment());
        assert_eq!(restored.cache(), built.cache());
    }
}
