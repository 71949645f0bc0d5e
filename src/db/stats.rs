use geo::Rect;
use geoquery_types::GeometryKind;
use serde::{Deserialize, Serialize};

/// Snapshot of a store's contents and index shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of records in the store
    pub record_count: usize,
    pub point_count: usize,
    pub polyline_count: usize,
    pub polygon_count: usize,
    /// Levels in the R-tree; 1 when the root is a leaf
    pub index_height: usize,
    pub index_node_count: usize,
    /// Rectangle covering every record, `None` when empty
    pub bounds: Option<Rect>,
    /// Successful mutations since the store was created
    pub operations_count: u64,
}

impl StoreStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one record of `kind`.
    pub fn record_kind(&mut self, kind: GeometryKind) {
        self.record_count += 1;
        match kind {
            GeometryKind::Point => self.point_count += 1,
            GeometryKind::Polyline => self.polyline_count += 1,
            GeometryKind::Polygon => self.polygon_count += 1,
        }
    }

    pub fn count_of(&self, kind: GeometryKind) -> usize {
        match kind {
            GeometryKind::Point => self.point_count,
            GeometryKind::Polyline => self.polyline_count,
            GeometryKind::Polygon => self.polygon_count,
        }
    }
}
