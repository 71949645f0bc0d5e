//! Axis-aligned bounding rectangle math.
//!
//! All predicates treat rectangles as closed sets: touching edges intersect,
//! and a point on an edge is inside. Points degenerate to zero-area
//! rectangles, which the index handles like any other entry.

use crate::config::DistanceMetric;
use geo::{BoundingRect, Coord, HaversineMeasure, Rect, coord};
use geoquery_types::Geometry;

/// Minimal rectangle enclosing every coordinate of `geometry`.
///
/// Returns `None` only for a geometry without coordinates, which validation
/// rejects before anything reaches the index.
///
/// # Examples
///
/// ```rust
/// use geoquery::compute::bbox::bounding_rect;
/// use geoquery_types::Geometry;
///
/// let line = Geometry::polyline([(-5.0, 5.0), (15.0, 2.0)]);
/// let rect = bounding_rect(&line).unwrap();
/// assert_eq!(rect.min().x, -5.0);
/// assert_eq!(rect.max().y, 5.0);
/// ```
pub fn bounding_rect(geometry: &Geometry) -> Option<Rect> {
    match geometry {
        Geometry::Point(p) => Some(p.bounding_rect()),
        Geometry::Polyline(line) => line.bounding_rect(),
        Geometry::Polygon(poly) => poly.bounding_rect(),
    }
}

/// Zero-area rectangle at `coord`.
pub fn point_rect(coord: Coord) -> Rect {
    Rect::new(coord, coord)
}

pub fn union(a: &Rect, b: &Rect) -> Rect {
    Rect::new(
        coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

/// Union of every rectangle yielded, or `None` when empty.
pub fn union_all<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
    rects
        .into_iter()
        .fold(None, |acc: Option<Rect>, r| match acc {
            Some(acc) => Some(union(&acc, r)),
            None => Some(*r),
        })
}

pub fn intersects(a: &Rect, b: &Rect) -> bool {
    !(a.max().x < b.min().x
        || a.min().x > b.max().x
        || a.max().y < b.min().y
        || a.min().y > b.max().y)
}

/// Whether `outer` fully covers `inner`.
pub fn contains_rect(outer: &Rect, inner: &Rect) -> bool {
    outer.min().x <= inner.min().x
        && outer.min().y <= inner.min().y
        && outer.max().x >= inner.max().x
        && outer.max().y >= inner.max().y
}

pub fn contains_point(rect: &Rect, coord: Coord) -> bool {
    coord.x >= rect.min().x
        && coord.x <= rect.max().x
        && coord.y >= rect.min().y
        && coord.y <= rect.max().y
}

pub fn area(rect: &Rect) -> f64 {
    rect.width() * rect.height()
}

/// Area added to `rect` by growing it to also cover `other`.
pub fn enlargement(rect: &Rect, other: &Rect) -> f64 {
    area(&union(rect, other)) - area(rect)
}

pub fn center(rect: &Rect) -> Coord {
    coord! {
        x: (rect.min().x + rect.max().x) / 2.0,
        y: (rect.min().y + rect.max().y) / 2.0,
    }
}

/// Square of half-width `half_width` centred at `origin`.
pub fn around(origin: Coord, half_width: f64) -> Rect {
    Rect::new(
        coord! { x: origin.x - half_width, y: origin.y - half_width },
        coord! { x: origin.x + half_width, y: origin.y + half_width },
    )
}

/// Rectangle guaranteed to contain every location within `radius` of
/// `origin` under `metric`.
///
/// For the Euclidean metric this is the square circumscribing the circle.
/// For Haversine (`radius` in metres, coordinates in degrees) it is the
/// bounding-coordinates box of the spherical cap; when the cap reaches a pole
/// or crosses the antimeridian the longitude range widens to the full
/// [-180, 180] so the box stays a conservative superset.
///
/// # Examples
///
/// ```rust
/// use geoquery::DistanceMetric;
/// use geoquery::compute::bbox::radius_rect;
/// use geo::coord;
///
/// let rect = radius_rect(coord! { x: 0.0, y: 0.0 }, 2.0, DistanceMetric::Euclidean);
/// assert_eq!(rect.min().x, -2.0);
/// assert_eq!(rect.max().y, 2.0);
///
/// let cap = radius_rect(coord! { x: -74.0, y: 40.7 }, 1_000.0, DistanceMetric::Haversine);
/// assert!(cap.width() > cap.height());
/// ```
pub fn radius_rect(origin: Coord, radius: f64, metric: DistanceMetric) -> Rect {
    match metric {
        DistanceMetric::Euclidean => around(origin, radius),
        DistanceMetric::Haversine => spherical_cap_rect(origin, radius),
    }
}

fn spherical_cap_rect(origin: Coord, radius_m: f64) -> Rect {
    let earth_radius = HaversineMeasure::GRS80_MEAN_RADIUS.radius();
    let angular = radius_m / earth_radius;
    let lat = origin.y.to_radians();

    let min_lat = lat - angular;
    let max_lat = lat + angular;
    let half_pi = std::f64::consts::FRAC_PI_2;

    let full_lon = |min_lat: f64, max_lat: f64| {
        Rect::new(
            coord! { x: -180.0, y: min_lat.max(-half_pi).to_degrees() },
            coord! { x: 180.0, y: max_lat.min(half_pi).to_degrees() },
        )
    };

    if angular >= std::f64::consts::PI || max_lat >= half_pi || min_lat <= -half_pi {
        return full_lon(min_lat, max_lat);
    }

    let ratio = angular.sin() / lat.cos();
    if ratio >= 1.0 {
        return full_lon(min_lat, max_lat);
    }

    let delta_lon = ratio.asin().to_degrees();
    let min_lon = origin.x - delta_lon;
    let max_lon = origin.x + delta_lon;
    if min_lon < -180.0 || max_lon > 180.0 {
        return full_lon(min_lat, max_lat);
    }

    Rect::new(
        coord! { x: min_lon, y: min_lat.to_degrees() },
        coord! { x: max_lon, y: max_lat.to_degrees() },
    )
}

/// Approximate metric units spanned by one coordinate unit. Only used to size
/// the first k-nearest search rectangle.
pub(crate) fn units_per_degree(metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Euclidean => 1.0,
        DistanceMetric::Haversine => {
            HaversineMeasure::GRS80_MEAN_RADIUS.radius() * std::f64::consts::PI / 180.0
        }
    }
}
