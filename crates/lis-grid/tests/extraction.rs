//! Integration tests: variable listing and series extraction against the
//! scenario dataset.

use lis_common::{GeoPoint, GridIndex, LisError, SeriesSource, TimeRange};
use lis_grid::testdata::scenario_dataset;
use lis_grid::{list_available_variables, GeoreferencedDataset, GriddedDataset, SeriesExtractor};
use test_utils::date;

fn extractor() -> SeriesExtractor {
    let ds = GeoreferencedDataset::new(Box::new(scenario_dataset().unwrap())).unwrap();
    SeriesExtractor::new(ds).unwrap()
}

#[test]
fn test_variable_filter_keeps_three_dimensional() {
    let raw = scenario_dataset().unwrap();
    // Raw coordinate fields are 3-D too, so they are listed before georeferencing
    assert_eq!(
        list_available_variables(&raw),
        vec!["lat", "lon", "Streamflow_tavg", "Qs_tavg"]
    );

    let ex = extractor();
    assert_eq!(
        ex.list_available_variables(),
        vec!["Streamflow_tavg", "Qs_tavg"]
    );
    assert!(ex.dataset().variable("Landmask").is_some());
    assert!(ex.dataset().variable("SoilMoist_tavg").is_some());
}

#[test]
fn test_extract_at_point() {
    let mut ex = extractor();
    let series = ex
        .extract("Streamflow_tavg", GeoPoint::new(-99.8, 30.3))
        .unwrap();

    assert_eq!(series.len(), 5);
    assert_eq!(series.values(), &[10.0, 110.0, 210.0, 310.0, 410.0]);
    assert_eq!(series.timestamps()[0], date(2020, 1, 3));
    assert_eq!(series.timestamps()[4], date(2020, 1, 7));

    let prov = series.provenance();
    assert_eq!(prov.source, SeriesSource::ModelGrid);
    assert_eq!(prov.variable_name, "Streamflow_tavg");
    assert_eq!(prov.grid_index, Some(GridIndex::new(0, 1)));
    assert_eq!(prov.location, Some(GeoPoint::new(-100.0, 30.25)));
    assert_eq!(series.title(), "Streamflow_tavg");
}

#[test]
fn test_extract_at_index() {
    let mut ex = extractor();
    let series = ex.extract("Qs_tavg", GridIndex::new(2, 1)).unwrap();
    assert_eq!(series.values()[0], 1.2f32 as f64);
}

#[test]
fn test_extract_errors() {
    let mut ex = extractor();

    assert!(matches!(
        ex.extract("Evap_tavg", GridIndex::new(0, 0)),
        Err(LisError::UnknownVariable(_))
    ));
    assert!(matches!(
        ex.extract("Landmask", GridIndex::new(0, 0)),
        Err(LisError::UnknownVariable(_))
    ));
    assert!(matches!(
        ex.extract("SoilMoist_tavg", GridIndex::new(0, 0)),
        Err(LisError::UnknownVariable(_))
    ));
    assert!(matches!(
        ex.extract("lat", GridIndex::new(0, 0)),
        Err(LisError::UnknownVariable(_))
    ));
    assert!(matches!(
        ex.extract("Streamflow_tavg", GeoPoint::new(-101.0, 30.5)),
        Err(LisError::IndexOutOfRange { ix: -4, .. })
    ));
    assert!(matches!(
        ex.extract("Streamflow_tavg", GeoPoint::new(f64::NAN, 30.5)),
        Err(LisError::InvalidPoint(_))
    ));
}

#[test]
fn test_all_missing_cell_is_empty_selection() {
    let mut ex = extractor();
    match ex.extract("Qs_tavg", GridIndex::new(3, 3)) {
        Err(LisError::EmptySelection { variable, .. }) => assert_eq!(variable, "Qs_tavg"),
        other => panic!("expected EmptySelection, got {:?}", other.map(|s| s.len())),
    }
}

#[test]
fn test_extract_window() {
    let mut ex = extractor();
    let range = TimeRange::new(date(2020, 1, 4), date(2020, 1, 5));
    let series = ex
        .extract_window("Streamflow_tavg", GridIndex::new(1, 0), &range)
        .unwrap();
    assert_eq!(series.values(), &[101.0, 201.0]);

    let outside = TimeRange::new(date(2019, 1, 1), date(2019, 12, 31));
    assert!(matches!(
        ex.extract_window("Streamflow_tavg", GridIndex::new(1, 0), &outside),
        Err(LisError::EmptySelection { .. })
    ));
}

#[test]
fn test_cache_serves_repeat_extractions() {
    let mut ex = extractor().with_cache(8);

    let first = ex.extract("Streamflow_tavg", GridIndex::new(0, 1)).unwrap();
    // Same cell reached by a point
    let second = ex
        .extract("Streamflow_tavg", GeoPoint::new(-99.8, 30.3))
        .unwrap();
    assert_eq!(first, second);

    let stats = ex.cache_stats().unwrap();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);
}

#[test]
fn test_snapshot() {
    let ex = extractor();
    let snap = ex.snapshot("Qs_tavg", 0).unwrap();

    assert_eq!((snap.width, snap.height), (4, 4));
    assert_eq!(snap.time, date(2020, 1, 3));
    // Row-major, south row first
    assert_eq!(snap.data[snap.width + 2], 1.2);
    assert!(snap.data[3 * snap.width + 3].is_nan());
    assert_eq!(snap.value_range(), Some((0.0, 3.2)));
    assert_eq!(snap.bounds.max_lon, -99.0);

    assert!(ex.snapshot("Qs_tavg", 5).is_err());
    assert!(matches!(
        ex.snapshot("Evap_tavg", 0),
        Err(LisError::UnknownVariable(_))
    ));
}
