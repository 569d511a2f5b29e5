//! Integration test: write the scenario dataset as a Zarr V3 store and
//! read it back through `ZarrDatasetStore`.

use std::fs;

use lis_common::{GeoPoint, GridIndex, LisError};
use lis_grid::testdata::{scenario_dataset, write_zarr_dataset};
use lis_grid::{
    DatasetLocator, DatasetStore, GeoreferencedDataset, GriddedDataset, SeriesExtractor,
    ZarrDatasetStore,
};
use serde_json::json;
use test_utils::{assert_approx_eq, date};

fn write_store(root: &std::path::Path) -> DatasetLocator {
    let locator = DatasetLocator::object("eis-dh-hydro", "LIS/ROUTING");
    let path = root.join(locator.relative_path());
    write_zarr_dataset(&path, &scenario_dataset().unwrap()).expect("Failed to write Zarr store");
    locator
}

#[test]
fn test_zarr_metadata_roundtrip() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let locator = write_store(temp_dir.path());

    let store = ZarrDatasetStore::new(temp_dir.path());
    let ds = store.open_dataset(&locator).unwrap();

    let attrs = ds.attributes();
    assert_eq!(attrs.get("DX"), Some(&json!(0.25)));
    assert_eq!(attrs.get("SOUTH_WEST_CORNER_LON"), Some(&json!(-100.0)));

    // Declaration order follows the root `variables` list
    let names: Vec<&str> = ds.variables().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["lat", "lon", "Streamflow_tavg", "Qs_tavg", "Landmask", "SoilMoist_tavg", "time"]
    );

    let flow = ds.variable("Streamflow_tavg").unwrap();
    assert_eq!(flow.dims, vec!["time", "north_south", "east_west"]);
    assert_eq!(flow.units(), Some("m3/s"));
    assert!(!flow.attributes.contains_key("_ARRAY_DIMENSIONS"));

    assert_eq!(ds.dimension_len("time"), Some(5));
    assert_eq!(ds.dimension_len("north_south"), Some(4));
    assert_eq!(ds.dimension_len("SoilMoist_profile"), Some(2));
}

#[test]
fn test_zarr_time_axis_decoded() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let locator = write_store(temp_dir.path());

    let ds = ZarrDatasetStore::new(temp_dir.path())
        .open_dataset(&locator)
        .unwrap();
    let times = ds.times().unwrap();
    assert_eq!(times.len(), 5);
    assert_eq!(times[0], date(2020, 1, 3));
    assert_eq!(times[4], date(2020, 1, 7));
}

#[test]
fn test_zarr_reads_match_memory() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let locator = write_store(temp_dir.path());
    let memory = scenario_dataset().unwrap();

    let ds = ZarrDatasetStore::new(temp_dir.path())
        .open_dataset(&locator)
        .unwrap();

    for (ix, iy) in [(0, 0), (0, 1), (3, 2), (3, 3)] {
        assert_eq!(
            ds.read_cell_series("Streamflow_tavg", ix, iy).unwrap(),
            memory.read_cell_series("Streamflow_tavg", ix, iy).unwrap()
        );
    }
    assert_eq!(
        ds.read_time_slice("Qs_tavg", 2).unwrap(),
        memory.read_time_slice("Qs_tavg", 2).unwrap()
    );
    assert!(matches!(
        ds.read_cell_series("Streamflow_tavg", 4, 0),
        Err(LisError::IndexOutOfRange { .. })
    ));
}

#[test]
fn test_zarr_end_to_end_extraction() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let locator = write_store(temp_dir.path());

    let raw = ZarrDatasetStore::new(temp_dir.path())
        .open_dataset(&locator)
        .unwrap();
    let mut ex = SeriesExtractor::new(GeoreferencedDataset::new(raw).unwrap()).unwrap();

    assert_eq!(ex.list_available_variables(), vec!["Streamflow_tavg", "Qs_tavg"]);

    let series = ex
        .extract("Streamflow_tavg", GeoPoint::new(-99.8, 30.3))
        .unwrap();
    assert_eq!(series.values(), &[10.0, 110.0, 210.0, 310.0, 410.0]);

    // Fill value comes from the array's missing_value attribute
    assert!(matches!(
        ex.extract("Qs_tavg", GridIndex::new(3, 3)),
        Err(LisError::EmptySelection { .. })
    ));
    let qs = ex.extract("Qs_tavg", GridIndex::new(1, 1)).unwrap();
    assert_approx_eq!(qs.values()[1], 11.1, 1e-5);
}

#[test]
fn test_lexical_order_without_variables_attr() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let locator = write_store(temp_dir.path());
    let path = temp_dir.path().join(locator.relative_path());

    // Rewrite root metadata without the variables list
    let root_meta = path.join("zarr.json");
    let mut meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&root_meta).unwrap()).unwrap();
    meta["attributes"]
        .as_object_mut()
        .unwrap()
        .remove("variables");
    fs::write(&root_meta, serde_json::to_string(&meta).unwrap()).unwrap();

    let ds = ZarrDatasetStore::new(temp_dir.path())
        .open_dataset(&locator)
        .unwrap();
    let names: Vec<&str> = ds.variables().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Landmask", "Qs_tavg", "SoilMoist_tavg", "Streamflow_tavg", "lat", "lon", "time"]
    );
}

#[test]
fn test_missing_dataset() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = ZarrDatasetStore::new(temp_dir.path());
    assert!(matches!(
        store.open_dataset(&DatasetLocator::object("bucket", "absent")),
        Err(LisError::StorageError(_))
    ));
}
