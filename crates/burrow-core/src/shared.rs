//! The state every agent reads during the parallel phase of a tick.
//!
//! [`SharedWorld`] implements [`AgentEnv`] over the grid, the two region
//! partitions and the node table. Agents only ever get `&SharedWorld`;
//! the partitions are swapped whole under their write locks by the
//! coordinator between parallel phases.

use std::sync::Arc;

use burrow_agents::{AgentEnv, DecisionPolicy, PathTarget, PlannedRoute, RegionLayer, ResourceError};
use burrow_types::{PoiId, WorldPoint};
use burrow_world::{GridPath, PathGrid, RegionPartition, WorldError, find_path};
use parking_lot::RwLock;

use crate::nodes::NodeTable;

/// Grid, partitions, nodes and policy shared by all agents.
pub struct SharedWorld {
    grid: Arc<PathGrid>,
    extraction: RwLock<RegionPartition>,
    supply: RwLock<RegionPartition>,
    nodes: NodeTable,
    policy: Arc<dyn DecisionPolicy>,
}

impl SharedWorld {
    /// Assemble the shared state. Both partitions must be computed over
    /// `grid`.
    pub fn new(
        grid: Arc<PathGrid>,
        extraction: RegionPartition,
        supply: RegionPartition,
        nodes: NodeTable,
        policy: Arc<dyn DecisionPolicy>,
    ) -> Self {
        Self {
            grid,
            extraction: RwLock::new(extraction),
            supply: RwLock::new(supply),
            nodes,
            policy,
        }
    }

    /// The grid.
    pub const fn grid(&self) -> &Arc<PathGrid> {
        &self.grid
    }

    /// The partition of a layer.
    pub const fn partition(&self, layer: RegionLayer) -> &RwLock<RegionPartition> {
        match layer {
            RegionLayer::Extraction => &self.extraction,
            RegionLayer::Supply => &self.supply,
        }
    }

    /// The node table.
    pub const fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    fn route_from(&self, path: &GridPath, poi: Option<PoiId>) -> PlannedRoute {
        PlannedRoute {
            waypoints: path.cells.iter().map(|c| self.grid.world_of(*c)).collect(),
            poi,
            cost: path.cost,
        }
    }
}

impl std::fmt::Debug for SharedWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWorld")
            .field("cells", &self.grid.len())
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl AgentEnv for SharedWorld {
    fn node_diameter(&self) -> f32 {
        self.grid.node_diameter()
    }

    fn plan_route(&self, from: WorldPoint, target: PathTarget) -> Result<PlannedRoute, WorldError> {
        match target {
            PathTarget::Point(point) => {
                let path = find_path(&self.grid, self.grid.cell_of(from), self.grid.cell_of(point))?;
                Ok(self.route_from(&path, None))
            }
            PathTarget::Region(layer) => {
                let (poi, path) = self.partition(layer).read().route_to_region(from)?;
                Ok(self.route_from(&path, Some(poi)))
            }
        }
    }

    fn try_extract(&self, node: PoiId) -> Result<(), ResourceError> {
        self.nodes.try_extract(node)
    }

    fn try_consume(&self, node: PoiId) -> Result<(), ResourceError> {
        self.nodes.try_consume(node)
    }

    fn policy(&self) -> &dyn DecisionPolicy {
        self.policy.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use burrow_agents::StubPolicy;
    use burrow_types::GridCoord;

    use super::*;
    use crate::nodes::ResourceNode;

    fn world() -> SharedWorld {
        let grid = Arc::new(PathGrid::uniform(6, 6, 0).unwrap());
        let mut extraction = RegionPartition::new(Arc::clone(&grid));
        extraction.register_poi(PoiId(0), GridCoord::new(0, 0)).unwrap();
        extraction.register_poi(PoiId(1), GridCoord::new(5, 5)).unwrap();
        let mut supply = extraction.clone();
        supply.update_active_pois([PoiId(1)]);
        let nodes = NodeTable::new();
        nodes.insert(ResourceNode::new(PoiId(0), GridCoord::new(0, 0), 1, 1));
        SharedWorld::new(grid, extraction, supply, nodes, Arc::new(StubPolicy::new(2)))
    }

    #[test]
    fn region_routes_carry_their_poi() {
        let world = world();
        let from = world.grid().world_of(GridCoord::new(1, 1));
        let route = world.plan_route(from, PathTarget::Region(RegionLayer::Extraction)).unwrap();
        assert_eq!(route.poi, Some(PoiId(0)));
        assert_eq!(route.waypoints.last().copied(), Some(world.grid().world_of(GridCoord::new(0, 0))));

        let route = world.plan_route(from, PathTarget::Region(RegionLayer::Supply)).unwrap();
        assert_eq!(route.poi, Some(PoiId(1)));
        assert_eq!(route.cost, 56);
    }

    #[test]
    fn point_routes_have_no_poi() {
        let world = world();
        let from = world.grid().world_of(GridCoord::new(0, 0));
        let to = world.grid().world_of(GridCoord::new(3, 0));
        let route = world.plan_route(from, PathTarget::Point(to)).unwrap();
        assert_eq!(route.poi, None);
        assert_eq!(route.waypoints.len(), 4);
        assert_eq!(route.cost, 30);
    }

    #[test]
    fn empty_layer_is_an_error() {
        let world = world();
        world.partition(RegionLayer::Supply).write().update_active_pois([]);
        let result = world.plan_route(WorldPoint::ZERO, PathTarget::Region(RegionLayer::Supply));
        assert!(matches!(result, Err(WorldError::NoActivePoi)));
    }

    #[test]
    fn resource_calls_reach_the_node_table() {
        let world = world();
        assert!(world.try_consume(PoiId(0)).is_ok());
        assert!(world.try_extract(PoiId(0)).is_ok());
        assert_eq!(world.try_extract(PoiId(0)), Err(ResourceError::Depleted(PoiId(0))));
        assert_eq!(world.nodes().drain_depleted(), vec![PoiId(0)]);
    }
}
