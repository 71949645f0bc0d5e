//! Geometry computations: rectangle math, exact predicates, validation and
//! the spatial index.

pub mod bbox;
pub mod geometry;
pub mod spatial;
pub mod validation;
