//! # geoquery-types
//!
//! Core data model for the geoquery spatial engine.
//!
//! This crate provides the plain data the engine stores and indexes:
//!
//! - **Geometry**: `Geometry` (point, polyline, polygon) and its `GeometryKind` tag
//! - **Records**: `GeometryRecord`, its `RecordId`, `ReferenceSystem` and opaque `Attributes`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives. Nothing here validates coordinates; that is the
//! engine's job at its API boundary.
//!
//! ## Examples
//!
//! ```rust
//! use geoquery_types::geometry::Geometry;
//! use geoquery_types::record::{GeometryRecord, RecordId, ReferenceSystem};
//!
//! let cafe = GeometryRecord::new(
//!     RecordId(1),
//!     ReferenceSystem::WGS84,
//!     Geometry::point(-6.26, 53.35),
//! )
//! .with_attribute("name", "Brew Lab")
//! .with_attribute("category", "cafe");
//! assert_eq!(cafe.id, RecordId(1));
//! ```

pub mod geometry;
pub mod record;

pub use geometry::{Geometry, GeometryKind};
pub use record::{AttributeValue, Attributes, GeometryRecord, RecordId, ReferenceSystem};
