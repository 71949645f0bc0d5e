use geo::{Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Variant tag of a [`Geometry`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Point,
    Polyline,
    Polygon,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryKind::Point => "point",
            GeometryKind::Polyline => "polyline",
            GeometryKind::Polygon => "polygon",
        };
        f.write_str(name)
    }
}

/// Geometry payload of a record.
///
/// Coordinates are `(x, y)` = `(longitude, latitude)` pairs in the reference
/// system of the owning store. A polyline is an open `LineString` of at least
/// two coordinates; a polygon's exterior (and every interior ring) is a closed
/// ring of at least four coordinates whose first and last entries are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates", rename_all = "snake_case")]
pub enum Geometry {
    Point(Point),
    Polyline(LineString),
    Polygon(Polygon),
}

impl Geometry {
    /// Create a point geometry.
    ///
    /// # Examples
    ///
    /// ```
    /// use geoquery_types::geometry::{Geometry, GeometryKind};
    ///
    /// let g = Geometry::point(-74.0060, 40.7128);
    /// assert_eq!(g.kind(), GeometryKind::Point);
    /// ```
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Point::new(x, y))
    }

    /// Create a polyline from `(x, y)` pairs.
    pub fn polyline(coords: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Geometry::Polyline(LineString::from(
            coords.into_iter().map(Coord::from).collect::<Vec<_>>(),
        ))
    }

    /// Create a polygon without holes from `(x, y)` pairs.
    ///
    /// `geo` closes the ring on construction, so an open ring becomes closed
    /// here. Rings that are too short are left for the engine to reject.
    pub fn polygon(exterior: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self::polygon_with_holes(exterior, Vec::<Vec<(f64, f64)>>::new())
    }

    /// Create a polygon with interior rings.
    pub fn polygon_with_holes<E, H, R>(exterior: E, holes: H) -> Self
    where
        E: IntoIterator<Item = (f64, f64)>,
        H: IntoIterator<Item = R>,
        R: IntoIterator<Item = (f64, f64)>,
    {
        let exterior = ring(exterior);
        let interiors = holes.into_iter().map(ring).collect();
        Geometry::Polygon(Polygon::new(exterior, interiors))
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Polyline(_) => GeometryKind::Polyline,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    pub fn as_point(&self) -> Option<&Point> {
        match self {
            Geometry::Point(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_polyline(&self) -> Option<&LineString> {
        match self {
            Geometry::Polyline(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Geometry::Polygon(poly) => Some(poly),
            _ => None,
        }
    }
}

fn ring(coords: impl IntoIterator<Item = (f64, f64)>) -> LineString {
    LineString::from(coords.into_iter().map(Coord::from).collect::<Vec<_>>())
}

impl From<Point> for Geometry {
    fn from(point: Point) -> Self {
        Geometry::Point(point)
    }
}

impl From<LineString> for Geometry {
    fn from(line: LineString) -> Self {
        Geometry::Polyline(line)
    }
}

impl From<Polygon> for Geometry {
    fn from(polygon: Polygon) -> Self {
        Geometry::Polygon(polygon)
    }
}
