//! In-process spatial index and query engine for points, polylines and polygons.
//!
//! ```rust
//! use geoquery::{Geometry, GeometryRecord, GeometryStore, RecordId, ReferenceSystem};
//! use geo::{Point, polygon};
//!
//! let rs = ReferenceSystem::WGS84;
//! let mut store = GeometryStore::new(rs);
//! store.insert(GeometryRecord::new(RecordId(1), rs, Geometry::point(5.0, 5.0)))?;
//! store.insert(GeometryRecord::new(RecordId(2), rs, Geometry::point(15.0, 15.0)))?;
//!
//! let area = polygon![
//!     (x: 0.0, y: 0.0),
//!     (x: 0.0, y: 10.0),
//!     (x: 10.0, y: 10.0),
//!     (x: 10.0, y: 0.0),
//! ];
//! assert_eq!(store.within(&area)?, vec![RecordId(1)]);
//!
//! let nearest = store.nearest(&Point::new(0.0, 0.0), 1)?;
//! assert_eq!(nearest[0].id, RecordId(1));
//! # Ok::<(), geoquery::GeoQueryError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod db;
pub mod error;

pub use builder::StoreBuilder;
pub use compute::spatial::{Neighbor, QueryEngine, SpatialIndex};
pub use config::{Config, DistanceMetric};
pub use db::{GeometryStore, StoreStats, SyncGeometryStore};
pub use error::{GeoQueryError, Result};

pub use geo::{Point, Polygon, Rect};

pub use geoquery_types::{
    AttributeValue, Attributes, Geometry, GeometryKind, GeometryRecord, RecordId, ReferenceSystem,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoQueryError, GeometryStore, Result, StoreBuilder, SyncGeometryStore};

    pub use geo::{Point, Polygon, Rect};

    pub use crate::{Config, DistanceMetric, Neighbor};

    pub use crate::{Geometry, GeometryKind, GeometryRecord, RecordId, ReferenceSystem};
}
