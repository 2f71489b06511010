//! Grid and cost-cache snapshots.
//!
//! The world crate only produces and consumes opaque blobs; where they are
//! stored is up to the caller. A snapshot carries the grid, every registered
//! POI, the active subset and the cost cache, which is enough to rebuild a
//! [`RegionPartition`] without running any search.

use std::sync::Arc;

use burrow_types::PoiId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::grid::PathGrid;
use crate::partition::{CostCache, PointOfInterest, RegionPartition};

/// Everything needed to restore a partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionSnapshot {
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// The sampled grid.
    pub grid: PathGrid,
    /// Registered POIs, active or not.
    pub pois: Vec<PointOfInterest>,
    /// The active subset at save time.
    pub active: Vec<PoiId>,
    /// Cached per-POI cost columns.
    pub cache: CostCache,
}

impl PartitionSnapshot {
    /// Capture a partition.
    pub fn capture(partition: &RegionPartition) -> Self {
        Self {
            saved_at: Utc::now(),
            grid: PathGrid::clone(partition.grid()),
            pois: partition.registered().collect(),
            active: partition.active_pois().collect(),
            cache: partition.cache().clone(),
        }
    }

    /// Rebuild the partition from the cached costs.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] if the stored POIs are inconsistent with the
    /// stored grid.
    pub fn into_partition(self) -> Result<RegionPartition, WorldError> {
        let mut partition = RegionPartition::from_cache(Arc::new(self.grid), self.pois, self.cache)?;
        partition.update_active_pois(self.active);
        Ok(partition)
    }
}

/// Encode a partition (and its grid) as a JSON blob.
///
/// # Errors
///
/// Returns [`WorldError::Snapshot`] if encoding fails.
pub fn save(partition: &RegionPartition) -> Result<Vec<u8>, WorldError> {
    let snapshot = PartitionSnapshot::capture(partition);
    let bytes = serde_json::to_vec(&snapshot)?;
    tracing::info!(
        bytes = bytes.len(),
        pois = snapshot.pois.len(),
        "Partition snapshot encoded"
    );
    Ok(bytes)
}

/// Decode a blob produced by [`save`].
///
/// # Errors
///
/// Returns [`WorldError::Snapshot`] if the blob is not a valid snapshot.
pub fn load(bytes: &[u8]) -> Result<PartitionSnapshot, WorldError> {
    let snapshot: PartitionSnapshot = serde_json::from_slice(bytes)?;
    tracing::debug!(saved_at = %snapshot.saved_at, pois = snapshot.pois.len(), "Partition snapshot decoded");
    Ok(snapshot)
}
