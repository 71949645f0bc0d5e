//! The geometry store: authoritative records plus the index over them.
//!
//! [`GeometryStore`] owns every [`GeometryRecord`] and the [`SpatialIndex`]
//! built from their bounding rectangles. All mutation goes through it so the
//! two never disagree; queries borrow both through a [`QueryEngine`].

use crate::compute::bbox;
use crate::compute::spatial::{IndexEntry, Neighbor, QueryEngine, SpatialIndex};
use crate::compute::validation::validate_geometry;
use crate::config::Config;
use crate::error::{GeoQueryError, Result};
use geo::{Point, Polygon, Rect};
use geoquery_types::{Geometry, GeometryKind, GeometryRecord, RecordId, ReferenceSystem};
use rustc_hash::{FxHashMap, FxHashSet};

mod stats;
mod sync;

pub use stats::StoreStats;
pub use sync::SyncGeometryStore;

/// In-memory store of geometry records with an R-tree index.
///
/// `GeometryStore` is single-owner: mutation takes `&mut self`, queries take
/// `&self`. Wrap it in [`SyncGeometryStore`] to share it between threads.
///
/// Every record must use the reference system the store was created with.
/// Each operation validates its input before touching any state, so a
/// failed call leaves the store exactly as it was.
///
/// # Examples
///
/// ```rust
/// use geoquery::{Geometry, GeometryRecord, GeometryStore, RecordId, ReferenceSystem};
/// use geo::Point;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let rs = ReferenceSystem::WGS84;
/// let mut store = GeometryStore::new(rs);
/// for (id, x) in [(1, 0.0), (2, 1.0), (3, 10.0)] {
///     store.insert(GeometryRecord::new(RecordId(id), rs, Geometry::point(x, 0.0)))?;
/// }
///
/// let nearest = store.nearest(&Point::new(0.0, 0.0), 2)?;
/// let ids: Vec<u64> = nearest.iter().map(|n| n.id.get()).collect();
/// assert_eq!(ids, vec![1, 2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GeometryStore {
    reference_system: ReferenceSystem,
    config: Config,
    records: FxHashMap<RecordId, GeometryRecord>,
    index: SpatialIndex,
    operations: u64,
}

impl GeometryStore {
    /// Create an empty store with the default configuration.
    pub fn new(reference_system: ReferenceSystem) -> Self {
        Self {
            reference_system,
            config: Config::default(),
            records: FxHashMap::default(),
            index: SpatialIndex::default(),
            operations: 0,
        }
    }

    /// Create an empty store with a custom configuration.
    pub fn with_config(reference_system: ReferenceSystem, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reference_system,
            index: SpatialIndex::with_config(&config)?,
            config,
            records: FxHashMap::default(),
            operations: 0,
        })
    }

    pub fn reference_system(&self) -> ReferenceSystem {
        self.reference_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read access to the underlying index.
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn get(&self, id: RecordId) -> Option<&GeometryRecord> {
        self.records.get(&id)
    }

    /// All record ids in ascending order.
    pub fn ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.records.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all records in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &GeometryRecord> {
        self.records.values()
    }

    /// Validate `geometry` under this store's metric and return its
    /// bounding rectangle.
    fn checked_rect(&self, geometry: &Geometry) -> Result<Rect> {
        validate_geometry(geometry, self.config.distance_metric)?;
        bbox::bounding_rect(geometry).ok_or_else(|| {
            GeoQueryError::InvalidGeometry("geometry has no coordinates".to_string())
        })
    }

    fn checked_record(&self, record: &GeometryRecord) -> Result<Rect> {
        if record.reference_system != self.reference_system {
            return Err(GeoQueryError::ReferenceSystemMismatch {
                expected: self.reference_system,
                found: record.reference_system,
            });
        }
        self.checked_rect(&record.geometry)
    }

    /// Rectangle the index holds for a stored record.
    fn indexed_rect(record: &GeometryRecord) -> Result<Rect> {
        bbox::bounding_rect(&record.geometry).ok_or_else(|| {
            GeoQueryError::InvalidGeometry(format!("record {} has no coordinates", record.id))
        })
    }

    fn unindex(&mut self, id: RecordId, rect: &Rect) {
        if !self.index.delete(id, rect) {
            log::warn!("Index entry for record {} was missing", id);
        }
    }

    /// Insert a new record. Fails with `DuplicateId` when the id is taken.
    pub fn insert(&mut self, record: GeometryRecord) -> Result<()> {
        let rect = self.checked_record(&record)?;
        if self.records.contains_key(&record.id) {
            return Err(GeoQueryError::DuplicateId(record.id));
        }

        self.index.insert(record.id, rect);
        self.records.insert(record.id, record);
        self.operations += 1;
        Ok(())
    }

    /// Remove a record and return it.
    pub fn remove(&mut self, id: RecordId) -> Result<GeometryRecord> {
        let record = self.records.remove(&id).ok_or(GeoQueryError::NotFound(id))?;
        let rect = Self::indexed_rect(&record)?;
        self.unindex(id, &rect);
        self.operations += 1;
        Ok(record)
    }

    /// Replace a record's geometry, keeping its id and attributes.
    pub fn update(&mut self, id: RecordId, geometry: Geometry) -> Result<()> {
        let new_rect = self.checked_rect(&geometry)?;
        let old_rect = match self.records.get(&id) {
            Some(record) => Self::indexed_rect(record)?,
            None => return Err(GeoQueryError::NotFound(id)),
        };

        self.unindex(id, &old_rect);
        self.index.insert(id, new_rect);
        if let Some(record) = self.records.get_mut(&id) {
            record.geometry = geometry;
        }
        self.operations += 1;
        Ok(())
    }

    /// Insert `record`, or replace the stored record with the same id.
    /// Returns `true` when a new record was created.
    pub fn upsert(&mut self, record: GeometryRecord) -> Result<bool> {
        let new_rect = self.checked_record(&record)?;
        let created = match self.records.get(&record.id) {
            Some(existing) => {
                let old_rect = Self::indexed_rect(existing)?;
                self.unindex(record.id, &old_rect);
                false
            }
            None => true,
        };

        self.index.insert(record.id, new_rect);
        self.records.insert(record.id, record);
        self.operations += 1;
        Ok(created)
    }

    /// Insert many records at once; returns how many were inserted.
    ///
    /// The whole batch is validated first and nothing is inserted if any
    /// record fails. An empty store is packed in one pass instead of one
    /// insert per record.
    pub fn bulk_insert(
        &mut self,
        records: impl IntoIterator<Item = GeometryRecord>,
    ) -> Result<usize> {
        let records: Vec<GeometryRecord> = records.into_iter().collect();
        let mut entries = Vec::with_capacity(records.len());
        let mut seen = FxHashSet::default();

        for record in &records {
            let rect = self.checked_record(record)?;
            if self.records.contains_key(&record.id) || !seen.insert(record.id) {
                return Err(GeoQueryError::DuplicateId(record.id));
            }
            entries.push(IndexEntry::new(record.id, rect));
        }

        let count = records.len();
        if self.index.is_empty() {
            let (min_entries, max_entries) = (self.config.min_entries, self.config.max_entries);
            self.index = SpatialIndex::bulk_load(min_entries, max_entries, entries)?;
        } else {
            for entry in entries {
                self.index.insert(entry.id, entry.rect);
            }
        }

        self.records.reserve(count);
        self.records
            .extend(records.into_iter().map(|record| (record.id, record)));
        self.operations += count as u64;
        log::debug!(
            "Bulk inserted {} records; store now holds {}",
            count,
            self.records.len()
        );
        Ok(count)
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
        self.operations += 1;
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats::new();
        for record in self.records.values() {
            stats.record_kind(record.kind());
        }
        stats.index_height = self.index.height();
        stats.index_node_count = self.index.node_count();
        stats.bounds = self.index.bounds();
        stats.operations_count = self.operations;
        stats
    }

    /// Query engine over the current contents.
    pub fn query(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.records, &self.index, &self.config)
    }

    /// See [`QueryEngine::nearest`].
    pub fn nearest(&self, origin: &Point, k: usize) -> Result<Vec<Neighbor>> {
        self.query().nearest(origin, k)
    }

    pub fn nearest_of_kind(
        &self,
        origin: &Point,
        k: usize,
        kind: GeometryKind,
    ) -> Result<Vec<Neighbor>> {
        self.query().nearest_of_kind(origin, k, kind)
    }

    /// See [`QueryEngine::radius`].
    pub fn radius(&self, origin: &Point, distance: f64) -> Result<Vec<Neighbor>> {
        self.query().radius(origin, distance)
    }

    pub fn radius_of_kind(
        &self,
        origin: &Point,
        distance: f64,
        kind: GeometryKind,
    ) -> Result<Vec<Neighbor>> {
        self.query().radius_of_kind(origin, distance, kind)
    }

    /// See [`QueryEngine::within`].
    pub fn within(&self, polygon: &Polygon) -> Result<Vec<RecordId>> {
        self.query().within(polygon)
    }

    /// See [`QueryEngine::intersecting`].
    pub fn intersecting(&self, polygon: &Polygon) -> Result<Vec<RecordId>> {
        self.query().intersecting(polygon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceMetric;

    const RS: ReferenceSystem = ReferenceSystem::WGS84;

    fn point(id: u64, x: f64, y: f64) -> GeometryRecord {
        GeometryRecord::new(RecordId(id), RS, Geometry::point(x, y))
    }

    #[test]
    fn test_insert_rejects_foreign_reference_system() {
        let mut store = GeometryStore::new(RS);
        let geometry = Geometry::point(0.0, 0.0);
        let record = GeometryRecord::new(RecordId(1), ReferenceSystem::WEB_MERCATOR, geometry);
        assert_eq!(
            store.insert(record),
            Err(GeoQueryError::ReferenceSystemMismatch {
                expected: RS,
                found: ReferenceSystem::WEB_MERCATOR,
            })
        );
        assert!(store.is_empty());
        assert!(store.index().is_empty());
    }

    #[test]
    fn test_invalid_geometry_is_rejected_before_mutation() {
        let mut store = GeometryStore::new(RS);
        let bad = GeometryRecord::new(RecordId(1), RS, Geometry::polyline([(0.0, 0.0)]));
        assert!(matches!(store.insert(bad), Err(GeoQueryError::InvalidGeometry(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_keeps_attributes_and_moves_index_entry() {
        let mut store = GeometryStore::new(RS);
        store
            .insert(point(1, 0.0, 0.0).with_attribute("name", "Lift Hub"))
            .unwrap();
        store
            .update(RecordId(1), Geometry::point(50.0, 50.0))
            .unwrap();

        let record = store.get(RecordId(1)).unwrap();
        assert_eq!(record.geometry, Geometry::point(50.0, 50.0));
        assert_eq!(record.attributes.len(), 1);
        assert!(store.radius(&Point::new(0.0, 0.0), 1.0).unwrap().is_empty());
        assert_eq!(store.radius(&Point::new(50.0, 50.0), 1.0).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_update_leaves_store_unchanged() {
        let mut store = GeometryStore::new(RS);
        store.insert(point(1, 1.0, 1.0)).unwrap();
        let before = store.get(RecordId(1)).cloned();

        assert!(
            store
                .update(RecordId(1), Geometry::point(f64::NAN, 0.0))
                .is_err()
        );
        assert_eq!(store.get(RecordId(1)).cloned(), before);
        assert_eq!(
            store.update(RecordId(9), Geometry::point(0.0, 0.0)),
            Err(GeoQueryError::NotFound(RecordId(9)))
        );
        assert_eq!(store.index().len(), 1);
    }

    #[test]
    fn test_upsert_creates_then_replaces() {
        let mut store = GeometryStore::new(RS);
        assert!(store.upsert(point(1, 0.0, 0.0)).unwrap());
        let replacement = point(1, 3.0, 3.0).with_attribute("v", 2i64);
        assert!(!store.upsert(replacement).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.index().len(), 1);
        assert_eq!(
            store.get(RecordId(1)).unwrap().geometry,
            Geometry::point(3.0, 3.0)
        );
    }

    #[test]
    fn test_bulk_insert_is_all_or_nothing() {
        let mut store = GeometryStore::new(RS);
        store.insert(point(5, 0.0, 0.0)).unwrap();

        let batch = vec![point(1, 1.0, 1.0), point(5, 2.0, 2.0)];
        assert_eq!(
            store.bulk_insert(batch),
            Err(GeoQueryError::DuplicateId(RecordId(5)))
        );
        assert_eq!(store.len(), 1);

        let batch = vec![point(1, 1.0, 1.0), point(1, 2.0, 2.0)];
        assert_eq!(
            store.bulk_insert(batch),
            Err(GeoQueryError::DuplicateId(RecordId(1)))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_bulk_insert_rejects_foreign_reference_system_without_mutation() {
        let mut store = GeometryStore::new(RS);
        let foreign = |id: u64| {
            GeometryRecord::new(
                RecordId(id),
                ReferenceSystem::WEB_MERCATOR,
                Geometry::point(id as f64, 0.0),
            )
        };
        let batch = vec![
            point(1, 1.0, 1.0),
            foreign(2),
            point(3, 3.0, 3.0),
            foreign(4),
        ];
        assert_eq!(
            store.bulk_insert(batch),
            Err(GeoQueryError::ReferenceSystemMismatch {
                expected: RS,
                found: ReferenceSystem::WEB_MERCATOR,
            })
        );
        assert!(store.is_empty());
        assert!(store.index().is_empty());
        assert_eq!(store.stats().operations_count, 0);

        // A later valid batch still packs into the empty index.
        let batch = vec![point(1, 1.0, 1.0), point(3, 3.0, 3.0)];
        assert_eq!(store.bulk_insert(batch), Ok(2));
        assert_eq!(store.index().len(), 2);
    }

    #[test]
    fn test_bulk_insert_into_empty_store_packs_index() {
        let mut store = GeometryStore::new(RS);
        let inserted = store
            .bulk_insert((0..200u64).map(|i| point(i, (i % 20) as f64, (i / 20) as f64)))
            .unwrap();
        assert_eq!(inserted, 200);
        assert_eq!(store.index().len(), 200);

        let hits = store.nearest(&Point::new(0.0, 0.0), 3).unwrap();
        let ids: Vec<u64> = hits.iter().map(|n| n.id.get()).collect();
        assert_eq!(ids, vec![0, 1, 20]);
    }

    #[test]
    fn test_stats() {
        let mut store = GeometryStore::new(RS);
        store.insert(point(1, 0.0, 0.0)).unwrap();
        let line = Geometry::polyline([(0.0, 0.0), (4.0, 2.0)]);
        store
            .insert(GeometryRecord::new(RecordId(2), RS, line))
            .unwrap();
        store.remove(RecordId(1)).unwrap();

        let stats = store.stats();
        assert_eq!(stats.record_count, 1);
        assert_eq!(stats.polyline_count, 1);
        assert_eq!(stats.operations_count, 3);
        assert_eq!(stats.index_height, 1);
        assert_eq!(stats.bounds, Some(Rect::new((0.0, 0.0), (4.0, 2.0))));
    }

    #[test]
    fn test_haversine_store_validates_ranges() {
        let config = Config::default().with_distance_metric(DistanceMetric::Haversine);
        let mut store = GeometryStore::with_config(RS, config).unwrap();
        assert!(store.insert(point(1, 200.0, 0.0)).is_err());
        assert!(store.insert(point(1, -74.0, 40.7)).is_ok());
    }

    #[test]
    fn test_with_config_rejects_invalid_config() {
        let config = Config::default().with_fanout(4, 6);
        assert!(matches!(
            GeometryStore::with_config(RS, config),
            Err(GeoQueryError::InvalidConfig(_))
        ));
    }
}
