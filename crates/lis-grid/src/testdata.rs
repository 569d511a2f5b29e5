//! Test data generation utilities.
//!
//! Synthetic LIS routing datasets with known values, in memory and written
//! out as Zarr stores, for unit tests, integration tests and benches.
//!
//! # Scenario dataset
//!
//! | Property | Value |
//! |----------|-------|
//! | Grid | 4 x 4, `DX = DY = 0.25`, south-west corner (-100.0, 30.0) |
//! | Time | daily, 2020-01-03 .. 2020-01-07 (5 steps) |
//! | `Streamflow_tavg` | `t * 100 + iy * 10 + ix` |
//! | `Qs_tavg` | like `Streamflow_tavg` / 10, cell (3, 3) all `-9999` (missing) |
//! | `Landmask` | 2-D static mask |
//! | `SoilMoist_tavg` | 4-D with a `SoilMoist_profile` layer dimension |
//! | `lat`, `lon` | raw coordinate fields, dropped when georeferenced |

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Map, Value};
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

use crate::dataset::{
    GriddedDataset, MemoryDataset, ARRAY_DIMENSIONS_ATTR, TIME_DIM, VARIABLES_ATTR,
};
use crate::georef::{DX_ATTR, DY_ATTR, SW_LAT_ATTR, SW_LON_ATTR};

/// Units written for the time coordinate.
pub const TIME_UNITS: &str = "minutes since 2000-01-01 00:00:00";

/// Sentinel used for missing `Qs_tavg` cells.
pub const MISSING_VALUE: f32 = -9999.0;

/// `n` consecutive days starting at `start`.
pub fn daily_times(start: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
    (0..n).map(|i| start + Duration::days(i as i64)).collect()
}

/// Values in (time, north_south, east_west) order from a cell function.
pub fn cell_values(nt: usize, ny: usize, nx: usize, f: impl Fn(usize, usize, usize) -> f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(nt * ny * nx);
    for t in 0..nt {
        for iy in 0..ny {
            for ix in 0..nx {
                data.push(f(t, iy, ix));
            }
        }
    }
    data
}

/// Bare grid with the four georeferencing attributes and no variables.
pub fn bare_grid(
    times: Vec<DateTime<Utc>>,
    nx: usize,
    ny: usize,
    cell_size: f64,
    origin: (f64, f64),
) -> MemoryDataset {
    MemoryDataset::new(times, nx, ny)
        .with_attribute(DX_ATTR, json!(cell_size))
        .with_attribute(DY_ATTR, json!(cell_size))
        .with_attribute(SW_LON_ATTR, json!(origin.0))
        .with_attribute(SW_LAT_ATTR, json!(origin.1))
}

/// Build the scenario dataset described in the module docs.
pub fn scenario_dataset() -> lis_common::Result<MemoryDataset> {
    let start = Utc
        .with_ymd_and_hms(2020, 1, 3, 0, 0, 0)
        .single()
        .ok_or_else(|| lis_common::LisError::parse("invalid scenario start"))?;
    let (nt, ny, nx) = (5, 4, 4);
    let cell = ["time", "north_south", "east_west"];

    bare_grid(daily_times(start, nt), nx, ny, 0.25, (-100.0, 30.0))
        .with_attribute("title", json!("LIS land surface model output"))
        .with_dimension("SoilMoist_profile", 2)
        .with_variable(
            "lat",
            &cell,
            cell_values(nt, ny, nx, |_, iy, _| 30.0 + iy as f32 * 0.25),
        )?
        .with_variable(
            "lon",
            &cell,
            cell_values(nt, ny, nx, |_, _, ix| -100.0 + ix as f32 * 0.25),
        )?
        .with_variable(
            "Streamflow_tavg",
            &cell,
            cell_values(nt, ny, nx, |t, iy, ix| (t * 100 + iy * 10 + ix) as f32),
        )?
        .with_variable_attribute("Streamflow_tavg", "units", json!("m3/s"))?
        .with_variable(
            "Qs_tavg",
            &cell,
            cell_values(nt, ny, nx, |t, iy, ix| {
                if (ix, iy) == (3, 3) {
                    MISSING_VALUE
                } else {
                    (t * 100 + iy * 10 + ix) as f32 / 10.0
                }
            }),
        )?
        .with_variable_attribute("Qs_tavg", "missing_value", json!(MISSING_VALUE))?
        .with_variable("Landmask", &["north_south", "east_west"], vec![1.0; ny * nx])?
        .with_variable(
            "SoilMoist_tavg",
            &["time", "SoilMoist_profile", "north_south", "east_west"],
            vec![0.25; nt * 2 * ny * nx],
        )
}

/// Write a dataset as a LIS-style Zarr V3 store.
///
/// The root group carries the dataset attributes plus a `variables` list;
/// the time axis is written as a `time` array in [`TIME_UNITS`].
pub fn write_zarr_dataset(
    path: &Path,
    dataset: &MemoryDataset,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(path)?;
    let store = Arc::new(FilesystemStore::new(path)?);

    let mut names: Vec<String> = dataset.variables().iter().map(|v| v.name.clone()).collect();
    names.push(TIME_DIM.to_string());

    let mut root_attrs = dataset.attributes().clone();
    root_attrs.insert(VARIABLES_ATTR.to_string(), json!(names));
    GroupBuilder::new()
        .attributes(root_attrs)
        .build(store.clone(), "/")?
        .store_metadata()?;

    for var in dataset.variables() {
        let shape: Vec<u64> = var
            .dims
            .iter()
            .map(|d| dataset.dimension_len(d).unwrap_or(0) as u64)
            .collect();
        let data = dataset
            .data(&var.name)
            .ok_or_else(|| format!("no data for {}", var.name))?;

        let mut attrs = var.attributes.clone();
        attrs.insert(ARRAY_DIMENSIONS_ATTR.to_string(), json!(var.dims));

        let chunk_shape: Vec<u64> = shape.iter().map(|n| (*n).max(1)).collect();
        let array = ArrayBuilder::new(
            shape.clone(),
            DataType::Float32,
            chunk_shape.try_into()?,
            FillValue::from(f32::NAN),
        )
        .attributes(attrs)
        .build(store.clone(), &format!("/{}", var.name))?;
        array.store_metadata()?;

        let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape)?;
        array.store_array_subset_elements(&subset, data)?;
    }

    let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single().ok_or("invalid epoch")?;
    let offsets: Vec<f64> = dataset
        .times()?
        .iter()
        .map(|t| (*t - epoch).num_minutes() as f64)
        .collect();
    let len = offsets.len().max(1) as u64;

    let mut attrs = Map::new();
    attrs.insert("units".to_string(), Value::from(TIME_UNITS));
    attrs.insert(ARRAY_DIMENSIONS_ATTR.to_string(), json!([TIME_DIM]));

    let array = ArrayBuilder::new(
        vec![offsets.len() as u64],
        DataType::Float64,
        vec![len].try_into()?,
        FillValue::from(f64::NAN),
    )
    .attributes(attrs)
    .build(store.clone(), &format!("/{}", TIME_DIM))?;
    array.store_metadata()?;

    let subset = ArraySubset::new_with_start_shape(vec![0], vec![offsets.len() as u64])?;
    array.store_array_subset_elements(&subset, offsets.as_slice())?;

    Ok(())
}
