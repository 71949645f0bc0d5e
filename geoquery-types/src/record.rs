use crate::geometry::{Geometry, GeometryKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Caller-assigned record identifier, immutable once inserted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Spatial reference system identifier (an EPSG/SRID code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceSystem(pub u32);

impl ReferenceSystem {
    /// WGS 84 longitude/latitude, EPSG:4326.
    pub const WGS84: ReferenceSystem = ReferenceSystem(4326);

    /// Web Mercator, EPSG:3857.
    pub const WEB_MERCATOR: ReferenceSystem = ReferenceSystem(3857);

    pub const fn srid(self) -> u32 {
        self.0
    }
}

impl Default for ReferenceSystem {
    fn default() -> Self {
        Self::WGS84
    }
}

impl fmt::Display for ReferenceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// Scalar attribute value carried alongside a geometry.
///
/// The engine never inspects these; they are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

/// Caller-opaque attribute map. Ordered so records compare and print stably.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A geometry plus its identifier and caller-supplied attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    pub id: RecordId,
    pub reference_system: ReferenceSystem,
    pub geometry: Geometry,
    #[serde(default)]
    pub attributes: Attributes,
}

impl GeometryRecord {
    pub fn new(id: RecordId, reference_system: ReferenceSystem, geometry: Geometry) -> Self {
        Self {
            id,
            reference_system,
            geometry,
            attributes: Attributes::new(),
        }
    }

    /// Attach an attribute, replacing any previous value under `key`.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn kind(&self) -> GeometryKind {
        self.geometry.kind()
    }
}
