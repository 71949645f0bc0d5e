//! Error types for the geoquery engine.

use geoquery_types::{RecordId, ReferenceSystem};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeoQueryError>;

/// Every failure the engine reports. All kinds are locally recoverable;
/// an empty query result is a success, never one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoQueryError {
    #[error("record {0} already exists")]
    DuplicateId(RecordId),

    #[error("record {0} not found")]
    NotFound(RecordId),

    #[error("reference system mismatch: store uses {expected}, record uses {found}")]
    ReferenceSystemMismatch {
        expected: ReferenceSystem,
        found: ReferenceSystem,
    },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid query parameter: {0}")]
    InvalidQueryParameter(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GeoQueryError {
    /// Re-tag a geometry error raised while checking a query argument.
    pub(crate) fn into_query_error(self) -> Self {
        match self {
            GeoQueryError::InvalidGeometry(msg) => GeoQueryError::InvalidQueryParameter(msg),
            other => other,
        }
    }
}
