//! Gridded dataset abstraction and store implementations.
//!
//! A dataset is a set of named variables over named dimensions plus a JSON
//! attribute map. LIS routing output uses the native dimensions `time`,
//! `north_south` and `east_west`; georeferencing attributes live in the
//! global attributes.

mod memory;
mod zarr;

pub use memory::{MemoryDataset, MemoryDatasetStore};
pub use zarr::{ZarrDataset, ZarrDatasetStore, ARRAY_DIMENSIONS_ATTR, VARIABLES_ATTR};

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use lis_common::{LisError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the time dimension.
pub const TIME_DIM: &str = "time";
/// Native longitude index dimension.
pub const EAST_WEST_DIM: &str = "east_west";
/// Native latitude index dimension.
pub const NORTH_SOUTH_DIM: &str = "north_south";
/// Longitude dimension after georeferencing.
pub const LON_DIM: &str = "lon";
/// Latitude dimension after georeferencing.
pub const LAT_DIM: &str = "lat";

/// A named dimension and its length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

impl Dimension {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
        }
    }
}

/// Declaration of a variable: name, dimension names and attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub dims: Vec<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl VariableInfo {
    pub fn new(name: impl Into<String>, dims: &[&str]) -> Self {
        Self {
            name: name.into(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            attributes: Map::new(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn units(&self) -> Option<&str> {
        self.attributes.get("units").and_then(|v| v.as_str())
    }

    /// Sentinel marking missing cells (`_FillValue` or `missing_value`).
    pub fn fill_value(&self) -> Option<f64> {
        ["_FillValue", "missing_value"]
            .iter()
            .find_map(|key| self.attributes.get(*key).and_then(attribute_number))
    }

    /// Positions of the time, latitude and longitude dimensions.
    ///
    /// Accepts either the native (`north_south`/`east_west`) or the
    /// georeferenced (`lat`/`lon`) names.
    pub fn cell_axes(&self) -> Result<CellAxes> {
        let find = |names: &[&str]| self.dims.iter().position(|d| names.contains(&d.as_str()));

        let time = find(&[TIME_DIM]);
        let lat = find(&[NORTH_SOUTH_DIM, LAT_DIM]);
        let lon = find(&[EAST_WEST_DIM, LON_DIM]);

        match (time, lat, lon) {
            (Some(time), Some(lat), Some(lon)) if self.ndim() == 3 => Ok(CellAxes { time, lat, lon }),
            _ => Err(LisError::UnknownVariable(format!(
                "{} (dimensions {:?} are not time x lat x lon)",
                self.name, self.dims
            ))),
        }
    }
}

/// Axis positions of a 3-D (time, lat, lon) variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAxes {
    pub time: usize,
    pub lat: usize,
    pub lon: usize,
}

/// Read a numeric attribute value.
///
/// Attributes copied from NetCDF often arrive as one-element arrays or as
/// strings, so both are accepted.
pub fn attribute_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) if items.len() == 1 => attribute_number(&items[0]),
        _ => None,
    }
}

/// Access to a gridded dataset.
///
/// Reads are blocking; any parallelism lives inside the implementation.
pub trait GriddedDataset: Send + Sync {
    /// Global attributes.
    fn attributes(&self) -> &Map<String, Value>;

    /// Dimensions in declaration order.
    fn dimensions(&self) -> &[Dimension];

    /// Variables in declaration order.
    fn variables(&self) -> &[VariableInfo];

    /// Decoded time axis.
    fn times(&self) -> Result<Vec<DateTime<Utc>>>;

    /// Full time extent of one cell, in native indices.
    fn read_cell_series(&self, variable: &str, ix: usize, iy: usize) -> Result<Vec<f32>>;

    /// One time step over the whole grid, row-major with the first
    /// latitude row first.
    fn read_time_slice(&self, variable: &str, t: usize) -> Result<Vec<f32>>;

    fn dimension_len(&self, name: &str) -> Option<usize> {
        self.dimensions()
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.len)
    }

    fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables().iter().find(|v| v.name == name)
    }
}

/// Where to find a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetLocator {
    /// Bucket/key pair, resolved to `{bucket}/{key}.zarr`.
    Object { bucket: String, key: String },
    /// Direct path to a dataset.
    Path(PathBuf),
}

impl DatasetLocator {
    pub fn object(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Object {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Parse `s3://bucket/key` into an object locator; anything else is a path.
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix("s3://") {
            let rest = rest.trim_matches('/');
            let (bucket, key) = rest
                .split_once('/')
                .ok_or_else(|| LisError::parse(format!("object locator needs bucket/key: {}", s)))?;
            let key = key.strip_suffix(".zarr").unwrap_or(key);
            if bucket.is_empty() || key.is_empty() {
                return Err(LisError::parse(format!("object locator needs bucket/key: {}", s)));
            }
            return Ok(Self::object(bucket, key));
        }
        Ok(Self::path(s))
    }

    /// Relative location of the dataset under a store root.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            Self::Object { bucket, key } => PathBuf::from(bucket).join(format!("{}.zarr", key)),
            Self::Path(path) => path.clone(),
        }
    }
}

impl fmt::Display for DatasetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object { bucket, key } => write!(f, "s3://{}/{}.zarr", bucket, key),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Opens datasets by locator.
///
/// Retries and remote access belong to implementations; the core calls
/// this once per dataset attach.
pub trait DatasetStore {
    fn open_dataset(&self, locator: &DatasetLocator) -> Result<Box<dyn GriddedDataset>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_number_forms() {
        assert_eq!(attribute_number(&json!(0.25)), Some(0.25));
        assert_eq!(attribute_number(&json!("0.25")), Some(0.25));
        assert_eq!(attribute_number(&json!([0.25])), Some(0.25));
        assert_eq!(attribute_number(&json!([0.25, 0.5])), None);
        assert_eq!(attribute_number(&json!("east")), None);
    }

    #[test]
    fn test_cell_axes() {
        let var = VariableInfo::new("Streamflow_tavg", &["time", "north_south", "east_west"]);
        assert_eq!(
            var.cell_axes().unwrap(),
            CellAxes {
                time: 0,
                lat: 1,
                lon: 2
            }
        );

        let renamed = VariableInfo::new("Streamflow_tavg", &["lon", "lat", "time"]);
        assert_eq!(
            renamed.cell_axes().unwrap(),
            CellAxes {
                time: 2,
                lat: 1,
                lon: 0
            }
        );

        let mask = VariableInfo::new("Landmask", &["north_south", "east_west"]);
        assert!(matches!(mask.cell_axes(), Err(LisError::UnknownVariable(_))));
    }

    #[test]
    fn test_fill_value() {
        let mut var = VariableInfo::new("Qs_tavg", &["time", "north_south", "east_west"]);
        assert_eq!(var.fill_value(), None);
        var.attributes.insert("missing_value".to_string(), json!(-9999.0));
        assert_eq!(var.fill_value(), Some(-9999.0));
    }

    #[test]
    fn test_locator_parse() {
        let loc = DatasetLocator::parse("s3://eis-dh-hydro/LIS/ROUTING.zarr").unwrap();
        assert_eq!(loc, DatasetLocator::object("eis-dh-hydro", "LIS/ROUTING"));
        assert_eq!(
            loc.relative_path(),
            PathBuf::from("eis-dh-hydro").join("LIS/ROUTING.zarr")
        );
        assert_eq!(loc.to_string(), "s3://eis-dh-hydro/LIS/ROUTING.zarr");

        let loc = DatasetLocator::parse("/data/routing.zarr").unwrap();
        assert_eq!(loc, DatasetLocator::path("/data/routing.zarr"));

        assert!(DatasetLocator::parse("s3://bucket-only").is_err());
    }
}
