//! Validation for geometries and query arguments.
//!
//! Every public store operation calls into here before touching the index,
//! so malformed input fails fast with a descriptive error and leaves the
//! store untouched.

use crate::config::DistanceMetric;
use crate::error::{GeoQueryError, Result};
use geo::{Coord, LineString, Point, Polygon};
use geoquery_types::Geometry;

/// Validates a single coordinate.
///
/// Coordinates must be finite. Under the spherical metric they must also be
/// valid longitude/latitude degrees: longitude in [-180.0, 180.0], latitude
/// in [-90.0, 90.0].
///
/// # Examples
///
/// ```
/// use geoquery::DistanceMetric;
/// use geoquery::compute::validation::validate_coord;
/// use geo::coord;
///
/// assert!(validate_coord(coord! { x: 500.0, y: 40.0 }, DistanceMetric::Euclidean).is_ok());
/// assert!(validate_coord(coord! { x: 500.0, y: 40.0 }, DistanceMetric::Haversine).is_err());
/// assert!(validate_coord(coord! { x: f64::NAN, y: 0.0 }, DistanceMetric::Euclidean).is_err());
/// ```
pub fn validate_coord(coord: Coord, metric: DistanceMetric) -> Result<()> {
    let (x, y) = (coord.x, coord.y);

    if !x.is_finite() {
        return Err(GeoQueryError::InvalidGeometry(format!(
            "x/longitude must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(GeoQueryError::InvalidGeometry(format!(
            "y/latitude must be finite, got: {}",
            y
        )));
    }

    if metric.is_spherical() {
        if !(-180.0..=180.0).contains(&x) {
            return Err(GeoQueryError::InvalidGeometry(format!(
                "Longitude out of range [-180.0, 180.0]: {}",
                x
            )));
        }

        if !(-90.0..=90.0).contains(&y) {
            return Err(GeoQueryError::InvalidGeometry(format!(
                "Latitude out of range [-90.0, 90.0]: {}",
                y
            )));
        }
    }

    Ok(())
}

fn validate_coords<'a>(
    coords: impl IntoIterator<Item = &'a Coord>,
    what: &str,
    metric: DistanceMetric,
) -> Result<()> {
    for (idx, coord) in coords.into_iter().enumerate() {
        validate_coord(*coord, metric).map_err(|e| {
            GeoQueryError::InvalidGeometry(format!("{} point at index {}: {}", what, idx, e))
        })?;
    }
    Ok(())
}

/// Validates a closed ring: at least four coordinates, first equals last.
pub fn validate_ring(ring: &LineString, what: &str, metric: DistanceMetric) -> Result<()> {
    if ring.0.len() < 4 {
        return Err(GeoQueryError::InvalidGeometry(format!(
            "{} needs at least 4 points (closed), got: {}",
            what,
            ring.0.len()
        )));
    }

    if ring.0.first() != ring.0.last() {
        return Err(GeoQueryError::InvalidGeometry(format!(
            "{} is not closed: first and last points differ",
            what
        )));
    }

    validate_coords(ring.coords(), what, metric)
}

/// Validates all polygon rings (exterior and interior).
///
/// # Examples
///
/// ```
/// use geoquery::DistanceMetric;
/// use geoquery::compute::validation::validate_polygon;
/// use geo::{polygon, Polygon};
///
/// let poly: Polygon = polygon![
///     (x: 0.0, y: 0.0),
///     (x: 0.0, y: 10.0),
///     (x: 10.0, y: 10.0),
///     (x: 10.0, y: 0.0),
///     (x: 0.0, y: 0.0),
/// ];
///
/// assert!(validate_polygon(&poly, DistanceMetric::Euclidean).is_ok());
/// ```
pub fn validate_polygon(polygon: &Polygon, metric: DistanceMetric) -> Result<()> {
    validate_ring(polygon.exterior(), "Exterior ring", metric)?;

    for (ring_idx, interior) in polygon.interiors().iter().enumerate() {
        validate_ring(interior, &format!("Interior ring {}", ring_idx), metric)?;
    }

    Ok(())
}

/// Validates a polyline: at least two finite coordinates.
pub fn validate_polyline(line: &LineString, metric: DistanceMetric) -> Result<()> {
    if line.0.len() < 2 {
        return Err(GeoQueryError::InvalidGeometry(format!(
            "Polyline needs at least 2 points, got: {}",
            line.0.len()
        )));
    }

    validate_coords(line.coords(), "Polyline", metric)
}

/// Validates any record geometry according to its kind.
pub fn validate_geometry(geometry: &Geometry, metric: DistanceMetric) -> Result<()> {
    match geometry {
        Geometry::Point(p) => validate_coord(p.0, metric),
        Geometry::Polyline(line) => validate_polyline(line, metric),
        Geometry::Polygon(poly) => validate_polygon(poly, metric),
    }
}

/// Validates a query origin.
pub fn validate_origin(origin: &Point, metric: DistanceMetric) -> Result<()> {
    validate_coord(origin.0, metric)
        .map_err(|e| GeoQueryError::InvalidQueryParameter(format!("origin: {}", e)))
}

/// Validates a polygon supplied as a query argument.
pub fn validate_query_polygon(polygon: &Polygon, metric: DistanceMetric) -> Result<()> {
    validate_polygon(polygon, metric).map_err(GeoQueryError::into_query_error)
}

pub fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(GeoQueryError::InvalidQueryParameter(
            "k must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_radius(radius: f64) -> Result<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(GeoQueryError::InvalidQueryParameter(format!(
            "radius must be a positive finite number, got: {}",
            radius
        )));
    }
    Ok(())
}

/// Validates R-tree fan-out bounds: `min_entries >= 1` and
/// `max_entries >= 2 * min_entries`, so a split can always give both halves
/// at least `min_entries`.
pub fn validate_fanout(min_entries: usize, max_entries: usize) -> Result<()> {
    if min_entries == 0 {
        return Err(GeoQueryError::InvalidConfig(
            "min_entries must be greater than zero".to_string(),
        ));
    }

    if max_entries < 2 * min_entries {
        return Err(GeoQueryError::InvalidConfig(format!(
            "max_entries ({}) must be at least twice min_entries ({})",
            max_entries, min_entries
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, line_string, polygon};

    const PLANAR: DistanceMetric = DistanceMetric::Euclidean;
    const SPHERICAL: DistanceMetric = DistanceMetric::Haversine;

    #[test]
    fn test_valid_geographic_coords() {
        let cases = [
            (-74.0060, 40.7128),
            (-0.1278, 51.5074),
            (139.6917, 35.6895),
            (180.0, 0.0),
            (-180.0, 0.0),
            (0.0, 90.0),
            (0.0, -90.0),
        ];
        for (x, y) in cases {
            assert!(validate_coord(coord! { x: x, y: y }, SPHERICAL).is_ok());
        }
    }

    #[test]
    fn test_out_of_range_only_matters_when_spherical() {
        let c = coord! { x: 200.0, y: 95.0 };
        assert!(validate_coord(c, SPHERICAL).is_err());
        assert!(validate_coord(c, PLANAR).is_ok());
    }

    #[test]
    fn test_non_finite_coordinates() {
        for c in [
            coord! { x: f64::NAN, y: 40.0 },
            coord! { x: -74.0, y: f64::NAN },
            coord! { x: f64::INFINITY, y: 40.0 },
            coord! { x: -74.0, y: f64::NEG_INFINITY },
        ] {
            assert!(matches!(
                validate_coord(c, PLANAR),
                Err(GeoQueryError::InvalidGeometry(_))
            ));
        }
    }

    #[test]
    fn test_polyline_rules() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)];
        assert!(validate_polyline(&line, PLANAR).is_ok());

        let single = line_string![(x: 0.0, y: 0.0)];
        assert!(validate_polyline(&single, PLANAR).is_err());
        assert!(validate_polyline(&LineString::new(vec![]), PLANAR).is_err());

        let not_finite = line_string![(x: 0.0, y: 0.0), (x: f64::NAN, y: 1.0)];
        assert!(validate_polyline(&not_finite, PLANAR).is_err());
    }

    #[test]
    fn test_ring_rules() {
        let open = line_string![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 0.0),
        ];
        assert!(validate_ring(&open, "ring", PLANAR).is_err());

        let short = line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)];
        assert!(validate_ring(&short, "ring", PLANAR).is_err());

        let closed = line_string![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        assert!(validate_ring(&closed, "ring", PLANAR).is_ok());
    }

    #[test]
    fn test_validate_polygon() {
        let valid: Polygon = polygon![
            (x: -80.0, y: 35.0),
            (x: -70.0, y: 35.0),
            (x: -70.0, y: 45.0),
            (x: -80.0, y: 45.0),
            (x: -80.0, y: 35.0),
        ];
        assert!(validate_polygon(&valid, SPHERICAL).is_ok());

        let invalid: Polygon = polygon![
            (x: -80.0, y: 35.0),
            (x: 999.0, y: 35.0),
            (x: -70.0, y: 45.0),
            (x: -80.0, y: 45.0),
            (x: -80.0, y: 35.0),
        ];
        assert!(validate_polygon(&invalid, SPHERICAL).is_err());
    }

    #[test]
    fn test_query_polygon_errors_are_query_errors() {
        let degenerate = Polygon::new(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)], vec![]);
        assert!(matches!(
            validate_query_polygon(&degenerate, PLANAR),
            Err(GeoQueryError::InvalidQueryParameter(_))
        ));
    }

    #[test]
    fn test_fanout_bounds() {
        assert!(validate_fanout(2, 4).is_ok());
        assert!(validate_fanout(1, 2).is_ok());
        assert!(matches!(validate_fanout(0, 0), Err(GeoQueryError::InvalidConfig(_))));
        assert!(validate_fanout(3, 5).is_err());
    }

    #[test]
    fn test_query_scalars() {
        assert!(validate_k(0).is_err());
        assert!(validate_k(1).is_ok());
        assert!(validate_radius(0.0).is_err());
        assert!(validate_radius(-2.0).is_err());
        assert!(validate_radius(f64::NAN).is_err());
        assert!(validate_radius(2.0).is_ok());
        assert!(validate_origin(&Point::new(f64::INFINITY, 0.0), PLANAR).is_err());
    }
}
