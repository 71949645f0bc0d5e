use geoquery::{
    Config, DistanceMetric, GeoQueryError, Geometry, GeometryKind, GeometryRecord, GeometryStore,
    Point, Polygon, RecordId, ReferenceSystem, StoreBuilder,
};

const RS: ReferenceSystem = ReferenceSystem::WGS84;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn point(id: u64, x: f64, y: f64) -> GeometryRecord {
    GeometryRecord::new(RecordId(id), RS, Geometry::point(x, y))
}

fn square(min: f64, max: f64) -> Polygon {
    Polygon::new(
        vec![(min, min), (min, max), (max, max), (max, min), (min, min)].into(),
        vec![],
    )
}

/// Test 1: Queries on an empty store succeed with nothing
#[test]
fn test_empty_store_queries() {
    let store = GeometryStore::new(RS);
    let origin = Point::new(0.0, 0.0);
    assert!(store.nearest(&origin, 10).unwrap().is_empty());
    assert!(store.radius(&origin, 5.0).unwrap().is_empty());
    assert!(store.within(&square(0.0, 1.0)).unwrap().is_empty());
    assert!(store.intersecting(&square(0.0, 1.0)).unwrap().is_empty());
    assert_eq!(store.stats().bounds, None);
}

/// Test 2: Malformed query arguments
#[test]
fn test_invalid_query_parameters() {
    let mut store = GeometryStore::new(RS);
    store.insert(point(1, 0.0, 0.0)).unwrap();
    let origin = Point::new(0.0, 0.0);

    let is_param_error = |e: GeoQueryError| matches!(e, GeoQueryError::InvalidQueryParameter(_));
    assert!(is_param_error(store.nearest(&origin, 0).unwrap_err()));
    assert!(is_param_error(store.radius(&origin, 0.0).unwrap_err()));
    assert!(is_param_error(store.radius(&origin, -3.0).unwrap_err()));
    assert!(is_param_error(store.radius(&origin, f64::INFINITY).unwrap_err()));
    assert!(is_param_error(store.nearest(&Point::new(f64::NAN, 1.0), 1).unwrap_err()));

    let triangle_open = Polygon::new(vec![(0.0, 0.0), (5.0, 0.0)].into(), vec![]);
    assert!(is_param_error(store.within(&triangle_open).unwrap_err()));
    assert!(is_param_error(store.intersecting(&triangle_open).unwrap_err()));

    let with_nan = Polygon::new(
        vec![(0.0, 0.0), (0.0, f64::NAN), (1.0, 1.0), (0.0, 0.0)].into(),
        vec![],
    );
    assert!(is_param_error(store.within(&with_nan).unwrap_err()));
}

/// Test 3: Invalid geometries never reach the index
#[test]
fn test_invalid_geometries_rejected() {
    let mut store = GeometryStore::new(RS);
    let bad = [
        Geometry::point(f64::NAN, 0.0),
        Geometry::point(0.0, f64::NEG_INFINITY),
        Geometry::polyline([(1.0, 1.0)]),
        Geometry::polyline([(0.0, 0.0), (f64::INFINITY, 1.0)]),
        Geometry::polygon([(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
    ];
    for (i, geometry) in bad.into_iter().enumerate() {
        let record = GeometryRecord::new(RecordId(i as u64), RS, geometry);
        assert!(matches!(
            store.insert(record),
            Err(GeoQueryError::InvalidGeometry(_))
        ));
    }
    assert!(store.is_empty());
    assert!(store.index().is_empty());
}

/// Test 4: Reference system mismatch on every entry point
#[test]
fn test_reference_system_mismatch() {
    let mut store = GeometryStore::new(RS);
    let geometry = Geometry::point(1.0, 1.0);
    let foreign = GeometryRecord::new(RecordId(1), ReferenceSystem(27700), geometry);

    assert!(matches!(
        store.insert(foreign.clone()),
        Err(GeoQueryError::ReferenceSystemMismatch { .. })
    ));
    assert!(matches!(
        store.upsert(foreign.clone()),
        Err(GeoQueryError::ReferenceSystemMismatch { .. })
    ));
    assert!(matches!(
        store.bulk_insert(vec![point(2, 0.0, 0.0), foreign]),
        Err(GeoQueryError::ReferenceSystemMismatch { .. })
    ));
    assert!(store.is_empty());
}

/// Test 5: Many records at the same location
#[test]
fn test_coincident_points() {
    let mut store = GeometryStore::new(RS);
    for i in (0..100u64).rev() {
        store.insert(point(i, 7.0, 7.0)).unwrap();
    }
    let hits = store.nearest(&Point::new(7.0, 7.0), 5).unwrap();
    let ids: Vec<u64> = hits.iter().map(|n| n.id.get()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);

    let far = store.nearest(&Point::new(-500.0, 300.0), 3).unwrap();
    assert_eq!(far.len(), 3);
    assert_eq!(far[0].id, RecordId(0));

    assert_eq!(store.within(&square(0.0, 10.0)).unwrap().len(), 100);
    for i in 0..100u64 {
        store.remove(RecordId(i)).unwrap();
    }
    assert!(store.index().is_empty());
}

/// Test 6: Forced full-scan fallback still returns exact answers
#[test]
fn test_nearest_full_scan_fallback() {
    init_logging();
    let config = Config::default()
        .with_knn_initial_radius(1e-9)
        .with_knn_max_retries(2);
    let mut store = GeometryStore::with_config(RS, config).unwrap();
    for i in 0..64u64 {
        store.insert(point(i, 1000.0 + i as f64, 1000.0)).unwrap();
    }
    let hits = store.nearest(&Point::new(0.0, 0.0), 2).unwrap();
    let ids: Vec<u64> = hits.iter().map(|n| n.id.get()).collect();
    assert_eq!(ids, vec![0, 1]);
}

/// Test 7: Geographic store in metres
#[test]
fn test_haversine_store() {
    init_logging();
    let mut store = StoreBuilder::new()
        .distance_metric(DistanceMetric::Haversine)
        .build()
        .unwrap();

    let nyc = Point::new(-74.0060, 40.7128);
    store.insert(point(1, -74.0060, 40.7128)).unwrap();
    store.insert(point(2, -0.1278, 51.5074)).unwrap();
    store.insert(point(3, 2.3522, 48.8566)).unwrap();
    store.insert(point(4, -73.9855, 40.7580)).unwrap();

    let near = store.radius(&nyc, 10_000.0).unwrap();
    let ids: Vec<u64> = near.iter().map(|n| n.id.get()).collect();
    assert_eq!(ids, vec![1, 4]);

    let nearest = store.nearest(&Point::new(-0.1, 51.5), 2).unwrap();
    let ids: Vec<u64> = nearest.iter().map(|n| n.id.get()).collect();
    assert_eq!(ids, vec![2, 3]);
    assert!(nearest[1].distance > 300_000.0 && nearest[1].distance < 400_000.0);

    assert!(matches!(
        store.insert(point(9, 181.0, 0.0)),
        Err(GeoQueryError::InvalidGeometry(_))
    ));
}

/// Test 8: Poles and the antimeridian
#[test]
fn test_extreme_coordinates() {
    let mut store = StoreBuilder::new()
        .distance_metric(DistanceMetric::Haversine)
        .build()
        .unwrap();
    store.insert(point(1, 0.0, 90.0)).unwrap();
    store.insert(point(2, 0.0, -90.0)).unwrap();
    store.insert(point(3, 180.0, 0.0)).unwrap();
    store.insert(point(4, -180.0, 0.0)).unwrap();
    store.insert(point(5, 179.9, 0.0)).unwrap();

    // Across the antimeridian: both 180 and -180 are the same meridian.
    let hits = store.radius(&Point::new(-179.95, 0.0), 20_000.0).unwrap();
    let ids: Vec<u64> = hits.iter().map(|n| n.id.get()).collect();
    assert_eq!(ids, vec![3, 4, 5]);

    let hits = store.radius(&Point::new(120.0, 89.95), 10_000.0).unwrap();
    let ids: Vec<u64> = hits.iter().map(|n| n.id.get()).collect();
    assert_eq!(ids, vec![1]);
}

/// Test 9: Kind-filtered queries skip other kinds entirely
#[test]
fn test_kind_filters() {
    let mut store = GeometryStore::new(RS);
    store.insert(point(1, 10.0, 0.0)).unwrap();
    store
        .insert(GeometryRecord::new(RecordId(2), RS, Geometry::Polygon(square(-1.0, 1.0))))
        .unwrap();
    store
        .insert(GeometryRecord::new(
            RecordId(3),
            RS,
            Geometry::polyline([(0.0, 3.0), (5.0, 3.0)]),
        ))
        .unwrap();

    let origin = Point::new(0.0, 0.0);
    let only_points = store
        .nearest_of_kind(&origin, 3, GeometryKind::Point)
        .unwrap();
    assert_eq!(only_points.len(), 1);
    assert_eq!(only_points[0].id, RecordId(1));

    let polygons = store
        .radius_of_kind(&origin, 100.0, GeometryKind::Polygon)
        .unwrap();
    assert_eq!(polygons.len(), 1);
    assert_eq!(polygons[0].distance, 0.0);
}

/// Test 10: Clearing resets the index
#[test]
fn test_clear() {
    let mut store = GeometryStore::new(RS);
    store
        .bulk_insert((0..100u64).map(|i| point(i, i as f64, 0.0)))
        .unwrap();
    assert!(store.stats().index_height > 1);
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.stats().index_height, 1);
    store.insert(point(1, 0.0, 0.0)).unwrap();
    assert_eq!(store.len(), 1);
}
