//! The four query types over a store's records and index.
//!
//! Every query narrows the search with [`SpatialIndex::search`] and then
//! refines the candidates with exact predicates from
//! [`crate::compute::geometry`]; a bounding-rectangle hit is never an answer
//! on its own.

use crate::compute::bbox;
use crate::compute::geometry::{distance_to_geometry, point_in_polygon, polyline_intersects_polygon};
use crate::compute::spatial::rtree::SpatialIndex;
use crate::compute::validation::{
    validate_k, validate_origin, validate_query_polygon, validate_radius,
};
use crate::config::{Config, DistanceMetric};
use crate::error::Result;
use geo::{BoundingRect, Point, Polygon};
use geoquery_types::{GeometryKind, GeometryRecord, RecordId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A ranked query hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: RecordId,
    /// Exact distance from the query origin under the store's metric
    pub distance: f64,
}

/// Stateless query layer borrowing a store's records, index and config.
///
/// Obtained from [`GeometryStore::query`](crate::GeometryStore::query); the
/// store's own query methods delegate here.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    records: &'a FxHashMap<RecordId, GeometryRecord>,
    index: &'a SpatialIndex,
    config: &'a Config,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        records: &'a FxHashMap<RecordId, GeometryRecord>,
        index: &'a SpatialIndex,
        config: &'a Config,
    ) -> Self {
        Self {
            records,
            index,
            config,
        }
    }

    fn metric(&self) -> DistanceMetric {
        self.config.distance_metric
    }

    /// The `k` records closest to `origin`, nearest first, ties by ascending id.
    ///
    /// Fewer than `k` records in the store is not an error; all of them are
    /// returned. `k` is clamped to `max_nearest` when configured.
    pub fn nearest(&self, origin: &Point, k: usize) -> Result<Vec<Neighbor>> {
        self.nearest_matching(origin, k, None)
    }

    /// Like [`nearest`](Self::nearest), considering only records of `kind`.
    pub fn nearest_of_kind(
        &self,
        origin: &Point,
        k: usize,
        kind: GeometryKind,
    ) -> Result<Vec<Neighbor>> {
        self.nearest_matching(origin, k, Some(kind))
    }

    /// Every record within `radius` of `origin` (inclusive), ascending by id.
    pub fn radius(&self, origin: &Point, radius: f64) -> Result<Vec<Neighbor>> {
        self.radius_matching(origin, radius, None)
    }

    /// Like [`radius`](Self::radius), considering only records of `kind`.
    pub fn radius_of_kind(
        &self,
        origin: &Point,
        radius: f64,
        kind: GeometryKind,
    ) -> Result<Vec<Neighbor>> {
        self.radius_matching(origin, radius, Some(kind))
    }

    /// Point records strictly inside `polygon`, ascending by id.
    ///
    /// A point on the boundary, or inside a hole, is not contained.
    pub fn within(&self, polygon: &Polygon) -> Result<Vec<RecordId>> {
        validate_query_polygon(polygon, self.metric())?;
        let Some(rect) = polygon.bounding_rect() else {
            return Ok(Vec::new());
        };

        let candidates = self.index.search(&rect);
        log::trace!("within: {} candidates", candidates.len());

        let mut ids: Vec<RecordId> = candidates
            .into_iter()
            .filter(|id| {
                self.records
                    .get(id)
                    .and_then(|record| record.geometry.as_point())
                    .is_some_and(|p| point_in_polygon(p.0, polygon))
            })
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Polyline records sharing at least one point with `polygon`, ascending
    /// by id.
    pub fn intersecting(&self, polygon: &Polygon) -> Result<Vec<RecordId>> {
        validate_query_polygon(polygon, self.metric())?;
        let Some(rect) = polygon.bounding_rect() else {
            return Ok(Vec::new());
        };

        let candidates = self.index.search(&rect);
        log::trace!("intersecting: {} candidates", candidates.len());

        let mut ids: Vec<RecordId> = candidates
            .into_iter()
            .filter(|id| {
                self.records
                    .get(id)
                    .and_then(|record| record.geometry.as_polyline())
                    .is_some_and(|line| polyline_intersects_polygon(line, polygon))
            })
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn nearest_matching(
        &self,
        origin: &Point,
        k: usize,
        kind: Option<GeometryKind>,
    ) -> Result<Vec<Neighbor>> {
        validate_origin(origin, self.metric())?;
        validate_k(k)?;
        let k = self.config.max_nearest.map_or(k, |limit| k.min(limit));

        if self.records.is_empty() {
            return Ok(Vec::new());
        }

        let mut radius = self.initial_radius(origin, k);
        for round in 0..self.config.knn_max_retries {
            let rect = bbox::radius_rect(origin.0, radius, self.metric());
            let candidates = self.index.search(&rect);
            let covers_all = candidates.len() >= self.records.len();
            let mut ranked = self.rank(origin, candidates, kind);

            // Anything outside the rectangle is farther than `radius`, so k
            // hits inside it are final.
            let settled = ranked.iter().take_while(|n| n.distance <= radius).count();
            if settled >= k || covers_all {
                log::trace!(
                    "nearest: settled after {} round(s) at radius {}",
                    round + 1,
                    radius
                );
                ranked.truncate(k);
                return Ok(ranked);
            }
            radius *= 2.0;
        }

        log::warn!(
            "k-nearest search did not settle after {} rounds; scanning all {} records",
            self.config.knn_max_retries,
            self.records.len()
        );
        let mut ranked = self.rank(origin, self.records.keys().copied().collect(), kind);
        ranked.truncate(k);
        Ok(ranked)
    }

    fn radius_matching(
        &self,
        origin: &Point,
        radius: f64,
        kind: Option<GeometryKind>,
    ) -> Result<Vec<Neighbor>> {
        validate_origin(origin, self.metric())?;
        validate_radius(radius)?;

        if self.records.is_empty() {
            return Ok(Vec::new());
        }

        let rect = bbox::radius_rect(origin.0, radius, self.metric());
        let candidates = self.index.search(&rect);
        log::trace!("radius: {} candidates", candidates.len());

        let mut hits = self.measure(origin, candidates, kind);
        hits.retain(|n| n.distance <= radius);
        hits.sort_unstable_by_key(|n| n.id);
        Ok(hits)
    }

    /// Exact distances for `ids` that match `kind`, unordered.
    fn measure(
        &self,
        origin: &Point,
        ids: Vec<RecordId>,
        kind: Option<GeometryKind>,
    ) -> Vec<Neighbor> {
        ids.into_iter()
            .filter_map(|id| self.records.get(&id))
            .filter(|record| kind.is_none_or(|kind| record.kind() == kind))
            .map(|record| Neighbor {
                id: record.id,
                distance: distance_to_geometry(origin.0, &record.geometry, self.metric()),
            })
            .collect()
    }

    /// Exact distances sorted nearest first, ties by ascending id.
    fn rank(
        &self,
        origin: &Point,
        ids: Vec<RecordId>,
        kind: Option<GeometryKind>,
    ) -> Vec<Neighbor> {
        let mut ranked = self.measure(origin, ids, kind);
        ranked.sort_unstable_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        ranked
    }

    /// First k-nearest search radius: the configured value, otherwise the gap
    /// between `origin` and the indexed extent plus a share of the extent's
    /// diagonal proportional to sqrt(k / n).
    fn initial_radius(&self, origin: &Point, k: usize) -> f64 {
        if let Some(radius) = self.config.knn_initial_radius {
            return radius;
        }

        let scale = bbox::units_per_degree(self.metric());
        let floor = scale * 1e-9;
        let Some(bounds) = self.index.bounds() else {
            return floor;
        };

        let (x, y) = origin.x_y();
        let dx = (bounds.min().x - x).max(x - bounds.max().x).max(0.0);
        let dy = (bounds.min().y - y).max(y - bounds.max().y).max(0.0);
        let gap = dx.hypot(dy);
        let diagonal = bounds.width().hypot(bounds.height());
        let share = (k as f64 / self.records.len().max(1) as f64).sqrt().min(1.0);

        let radius = (gap + diagonal * share / 2.0) * scale;
        if radius.is_finite() && radius > floor {
            radius
        } else {
            floor
        }
    }
}
