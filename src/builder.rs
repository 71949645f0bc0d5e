//! Store builder for flexible configuration
//!
//! This module provides a builder pattern for creating stores with a
//! reference system, R-tree fan-out and query settings.

use crate::config::{Config, DistanceMetric};
use crate::db::{GeometryStore, SyncGeometryStore};
use crate::error::Result;
use geoquery_types::ReferenceSystem;

/// Builder for [`GeometryStore`] and [`SyncGeometryStore`].
///
/// # Examples
///
/// ```rust
/// use geoquery::{DistanceMetric, ReferenceSystem, StoreBuilder};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = StoreBuilder::new()
///     .reference_system(ReferenceSystem::WGS84)
///     .distance_metric(DistanceMetric::Haversine)
///     .fanout(4, 16)
///     .build()?;
///
/// assert_eq!(store.config().max_entries, 16);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StoreBuilder {
    reference_system: ReferenceSystem,
    config: Config,
}

impl StoreBuilder {
    /// Create a new builder: WGS84, default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference_system(mut self, reference_system: ReferenceSystem) -> Self {
        self.reference_system = reference_system;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.config = self.config.with_distance_metric(metric);
        self
    }

    /// Set the R-tree node bounds.
    pub fn fanout(mut self, min_entries: usize, max_entries: usize) -> Self {
        self.config = self.config.with_fanout(min_entries, max_entries);
        self
    }

    pub fn max_nearest(mut self, limit: usize) -> Self {
        self.config = self.config.with_max_nearest(limit);
        self
    }

    /// Build the store. Fails when the configuration is invalid.
    pub fn build(self) -> Result<GeometryStore> {
        GeometryStore::with_config(self.reference_system, self.config)
    }

    pub fn build_sync(self) -> Result<SyncGeometryStore> {
        SyncGeometryStore::with_config(self.reference_system, self.config)
    }
}
