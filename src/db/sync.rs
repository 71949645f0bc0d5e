//! Thread-safe wrapper for concurrent store access.
//!
//! [`SyncGeometryStore`] wraps a [`GeometryStore`] in `Arc<RwLock<_>>`:
//! queries share the read lock, mutations take the write lock, so no reader
//! ever observes a half-rebalanced tree.
//!
//! # Examples
//!
//! ```rust
//! use geoquery::{Geometry, GeometryRecord, RecordId, ReferenceSystem, SyncGeometryStore};
//! use geo::Point;
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SyncGeometryStore::new(ReferenceSystem::WGS84);
//!
//! let writer = store.clone();
//! let handle = thread::spawn(move || {
//!     for i in 0..10u64 {
//!         let geometry = Geometry::point(i as f64, 0.0);
//!         let record = GeometryRecord::new(RecordId(i), ReferenceSystem::WGS84, geometry);
//!         writer.insert(record).unwrap();
//!     }
//! });
//! handle.join().unwrap();
//!
//! assert_eq!(store.nearest(&Point::new(0.0, 0.0), 3)?.len(), 3);
//! # Ok(())
//! # }
//! ```

use super::{GeometryStore, StoreStats};
use crate::compute::spatial::Neighbor;
use crate::config::Config;
use crate::error::Result;
use geo::{Point, Polygon};
use geoquery_types::{Geometry, GeometryKind, GeometryRecord, RecordId, ReferenceSystem};
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe handle around a [`GeometryStore`].
///
/// Cloning is cheap and every clone refers to the same store.
#[derive(Debug, Clone)]
pub struct SyncGeometryStore {
    inner: Arc<RwLock<GeometryStore>>,
}

impl SyncGeometryStore {
    pub fn new(reference_system: ReferenceSystem) -> Self {
        Self::from_store(GeometryStore::new(reference_system))
    }

    pub fn with_config(reference_system: ReferenceSystem, config: Config) -> Result<Self> {
        let store = GeometryStore::with_config(reference_system, config)?;
        Ok(Self::from_store(store))
    }

    pub fn from_store(store: GeometryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    // ===== Mutations =====

    pub fn insert(&self, record: GeometryRecord) -> Result<()> {
        self.inner.write().insert(record)
    }

    pub fn remove(&self, id: RecordId) -> Result<GeometryRecord> {
        self.inner.write().remove(id)
    }

    pub fn update(&self, id: RecordId, geometry: Geometry) -> Result<()> {
        self.inner.write().update(id, geometry)
    }

    pub fn upsert(&self, record: GeometryRecord) -> Result<bool> {
        self.inner.write().upsert(record)
    }

    pub fn bulk_insert(&self, records: impl IntoIterator<Item = GeometryRecord>) -> Result<usize> {
        self.inner.write().bulk_insert(records)
    }

    pub fn clear(&self) {
        self.inner.write().clear()
    }

    // ===== Reads =====

    /// Owned copy of the record, since the lock is released on return.
    pub fn get(&self, id: RecordId) -> Option<GeometryRecord> {
        self.inner.read().get(id).cloned()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.inner.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.inner.read().ids()
    }

    pub fn reference_system(&self) -> ReferenceSystem {
        self.inner.read().reference_system()
    }

    pub fn config(&self) -> Config {
        self.inner.read().config().clone()
    }

    pub fn stats(&self) -> StoreStats {
        self.inner.read().stats()
    }

    // ===== Queries =====

    pub fn nearest(&self, origin: &Point, k: usize) -> Result<Vec<Neighbor>> {
        self.inner.read().nearest(origin, k)
    }

    pub fn nearest_of_kind(
        &self,
        origin: &Point,
        k: usize,
        kind: GeometryKind,
    ) -> Result<Vec<Neighbor>> {
        self.inner.read().nearest_of_kind(origin, k, kind)
    }

    pub fn radius(&self, origin: &Point, distance: f64) -> Result<Vec<Neighbor>> {
        self.inner.read().radius(origin, distance)
    }

    pub fn radius_of_kind(
        &self,
        origin: &Point,
        distance: f64,
        kind: GeometryKind,
    ) -> Result<Vec<Neighbor>> {
        self.inner.read().radius_of_kind(origin, distance, kind)
    }

    pub fn within(&self, polygon: &Polygon) -> Result<Vec<RecordId>> {
        self.inner.read().within(polygon)
    }

    pub fn intersecting(&self, polygon: &Polygon) -> Result<Vec<RecordId>> {
        self.inner.read().intersecting(polygon)
    }

    /// Run `f` with shared access to the store, for several reads under one
    /// consistent snapshot.
    pub fn read<R>(&self, f: impl FnOnce(&GeometryStore) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access to the store.
    pub fn write<R>(&self, f: impl FnOnce(&mut GeometryStore) -> R) -> R {
        f(&mut self.inner.write())
    }
}
