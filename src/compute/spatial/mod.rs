//! Spatial indexing and the query engine built on top of it.

pub mod queries;
pub mod rtree;

pub use queries::{Neighbor, QueryEngine};
pub use rtree::{IndexEntry, SpatialIndex};
