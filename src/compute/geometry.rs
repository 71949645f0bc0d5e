//! Exact geometric predicates used to refine index candidates.
//!
//! The index only ever answers "whose bounding rectangle touches this
//! rectangle"; everything here decides the real answer. Point-in-polygon uses
//! crossing-number ray casting with an explicit on-boundary check, and a
//! point on any ring is never contained.

use crate::config::DistanceMetric;
use geo::{Coord, LineString, Point, Polygon};
use geoquery_types::Geometry;

/// Where a coordinate lies relative to one closed ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingPosition {
    Inside,
    Outside,
    Boundary,
}

/// Cross product of `(b - a) x (c - a)`; positive when `c` is left of `a -> b`.
fn orientation(a: Coord, b: Coord, c: Coord) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Whether `c` lies on the closed segment `a -> b`.
pub fn on_segment(a: Coord, b: Coord, c: Coord) -> bool {
    orientation(a, b, c) == 0.0
        && c.x >= a.x.min(b.x)
        && c.x <= a.x.max(b.x)
        && c.y >= a.y.min(b.y)
        && c.y <= a.y.max(b.y)
}

/// Whether closed segments `p1 -> p2` and `q1 -> q2` share at least one point.
/// Touching endpoints and collinear overlap both count.
///
/// # Examples
///
/// ```rust
/// use geoquery::compute::geometry::segments_intersect;
/// use geo::coord;
///
/// let a = coord! { x: -5.0, y: 5.0 };
/// let b = coord! { x: 15.0, y: 5.0 };
/// assert!(segments_intersect(a, b, coord! { x: 0.0, y: 0.0 }, coord! { x: 0.0, y: 10.0 }));
/// assert!(!segments_intersect(a, b, coord! { x: 0.0, y: 6.0 }, coord! { x: 10.0, y: 6.0 }));
/// ```
pub fn segments_intersect(p1: Coord, p2: Coord, q1: Coord, q2: Coord) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// Crossing-number test of `c` against a closed ring.
pub fn ring_position(c: Coord, ring: &LineString) -> RingPosition {
    let mut inside = false;
    for edge in ring.lines() {
        let (a, b) = (edge.start, edge.end);
        if on_segment(a, b, c) {
            return RingPosition::Boundary;
        }
        if (a.y > c.y) != (b.y > c.y) {
            let x_cross = a.x + (c.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if c.x < x_cross {
                inside = !inside;
            }
        }
    }
    if inside {
        RingPosition::Inside
    } else {
        RingPosition::Outside
    }
}

/// Whether `c` is strictly interior to `polygon`: inside the exterior ring,
/// outside every hole, and on no ring at all.
///
/// # Examples
///
/// ```rust
/// use geoquery::compute::geometry::point_in_polygon;
/// use geo::{coord, polygon};
///
/// let square = polygon![
///     (x: 0.0, y: 0.0),
///     (x: 0.0, y: 10.0),
///     (x: 10.0, y: 10.0),
///     (x: 10.0, y: 0.0),
///     (x: 0.0, y: 0.0),
/// ];
/// assert!(point_in_polygon(coord! { x: 5.0, y: 5.0 }, &square));
/// assert!(!point_in_polygon(coord! { x: 10.0, y: 5.0 }, &square));
/// assert!(!point_in_polygon(coord! { x: 15.0, y: 15.0 }, &square));
/// ```
pub fn point_in_polygon(c: Coord, polygon: &Polygon) -> bool {
    if ring_position(c, polygon.exterior()) != RingPosition::Inside {
        return false;
    }
    polygon
        .interiors()
        .iter()
        .all(|hole| ring_position(c, hole) == RingPosition::Outside)
}

/// Minimum distance from `p` to the closed segment `a -> b`.
///
/// Exact for the Euclidean metric. Under Haversine the result is an
/// approximation: the closest point is picked in a local equirectangular
/// projection centred on `p` and then measured with the haversine formula, so
/// it can overshoot the true great-circle minimum slightly (relative error
/// around 1e-4 for segments spanning a few degrees).
pub fn point_segment_distance(p: Coord, a: Coord, b: Coord, metric: DistanceMetric) -> f64 {
    let kx = match metric {
        DistanceMetric::Euclidean => 1.0,
        DistanceMetric::Haversine => p.y.to_radians().cos(),
    };
    let (dx, dy) = ((b.x - a.x) * kx, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * kx * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
    };
    let closest = Coord {
        x: a.x + t * (b.x - a.x),
        y: a.y + t * (b.y - a.y),
    };
    metric.distance(Point::from(p), Point::from(closest))
}

fn line_distance(p: Coord, line: &LineString, metric: DistanceMetric) -> f64 {
    let mut coords = line.coords();
    let Some(first) = coords.next() else {
        return f64::INFINITY;
    };
    let mut best = metric.distance(Point::from(p), Point::from(*first));
    for edge in line.lines() {
        best = best.min(point_segment_distance(p, edge.start, edge.end, metric));
    }
    best
}

/// Exact distance from `origin` to `geometry`: point-to-point for points,
/// minimum point-to-segment for polylines, and for polygons zero when
/// contained, else the distance to the nearest ring.
pub fn distance_to_geometry(origin: Coord, geometry: &Geometry, metric: DistanceMetric) -> f64 {
    match geometry {
        Geometry::Point(p) => metric.distance(Point::from(origin), *p),
        Geometry::Polyline(line) => line_distance(origin, line, metric),
        Geometry::Polygon(poly) => {
            if point_in_polygon(origin, poly) {
                return 0.0;
            }
            std::iter::once(poly.exterior())
                .chain(poly.interiors())
                .map(|ring| line_distance(origin, ring, metric))
                .fold(f64::INFINITY, f64::min)
        }
    }
}

/// Whether a polyline shares at least one point with `polygon`: some segment
/// touches some ring edge, or the line starts strictly inside.
pub fn polyline_intersects_polygon(line: &LineString, polygon: &Polygon) -> bool {
    let rings: Vec<&LineString> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .collect();

    let segments: Vec<(Coord, Coord)> = if line.0.len() == 1 {
        vec![(line.0[0], line.0[0])]
    } else {
        line.lines().map(|l| (l.start, l.end)).collect()
    };

    for (a, b) in &segments {
        for ring in &rings {
            if ring
                .lines()
                .any(|edge| segments_intersect(*a, *b, edge.start, edge.end))
            {
                return true;
            }
        }
    }

    line.0
        .first()
        .is_some_and(|start| point_in_polygon(*start, polygon))
}
