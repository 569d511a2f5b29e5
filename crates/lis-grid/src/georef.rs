//! Georeferencing of LIS native grids.
//!
//! LIS output carries no coordinate arrays usable for selection; the grid is
//! described by the cell sizes `DX`/`DY`, the south-west corner and the
//! lengths of the `east_west`/`north_south` dimensions. From these we build
//! half-open axes:
//!
//! ```text
//! lon[i] = lon0 + i * dx    for i in [0, nx)
//! lat[j] = lat0 + j * dy    for j in [0, ny)
//! ```
//!
//! The far corner `lon0 + nx * dx` is never part of the axis.

use chrono::{DateTime, Utc};
use lis_common::{GeoPoint, GridIndex, LisError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::dataset::{
    attribute_number, Dimension, GriddedDataset, VariableInfo, EAST_WEST_DIM, LAT_DIM, LON_DIM,
    NORTH_SOUTH_DIM,
};
use crate::types::GeoBounds;

/// Global attribute: cell size along longitude (degrees).
pub const DX_ATTR: &str = "DX";
/// Global attribute: cell size along latitude (degrees).
pub const DY_ATTR: &str = "DY";
/// Global attribute: latitude of the south-west corner.
pub const SW_LAT_ATTR: &str = "SOUTH_WEST_CORNER_LAT";
/// Global attribute: longitude of the south-west corner.
pub const SW_LON_ATTR: &str = "SOUTH_WEST_CORNER_LON";

/// Decimal places kept from the georeferencing attributes.
const ATTRIBUTE_PRECISION: i32 = 3;

/// Distance to an integer below which a scaled coordinate snaps to it
/// before flooring.
const INDEX_SNAP_TOLERANCE: f64 = 1e-9;

fn round_to_precision(value: f64) -> f64 {
    let factor = 10f64.powi(ATTRIBUTE_PRECISION);
    (value * factor).round() / factor
}

fn required_attribute(attrs: &Map<String, Value>, key: &str) -> Result<f64> {
    let value = attrs
        .get(key)
        .ok_or_else(|| LisError::missing_metadata(key))?;
    let number = attribute_number(value)
        .ok_or_else(|| LisError::invalid_metadata(key, format!("not a number: {}", value)))?;
    if !number.is_finite() {
        return Err(LisError::invalid_metadata(key, "not finite"));
    }
    Ok(round_to_precision(number))
}

/// Floor of a scaled coordinate, tolerant of representation error.
fn floor_index(scaled: f64) -> i64 {
    if !scaled.is_finite() {
        return i64::MIN;
    }
    let nearest = scaled.round();
    if (scaled - nearest).abs() < INDEX_SNAP_TOLERANCE {
        nearest as i64
    } else {
        scaled.floor() as i64
    }
}

/// Nearest of `n` axis nodes to a scaled coordinate.
fn nearest_node(scaled: f64, n: usize) -> i64 {
    let last = n.saturating_sub(1) as f64;
    scaled.round().clamp(0.0, last) as i64
}

/// Geographic description of a LIS grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridDescriptor {
    /// Cell size `(dx, dy)` in degrees.
    pub cell_size: (f64, f64),
    /// South-west corner `(lon0, lat0)`.
    pub origin: (f64, f64),
    /// Number of cells `(nx, ny)`.
    pub shape: (usize, usize),
    lon_axis: Vec<f64>,
    lat_axis: Vec<f64>,
}

impl GridDescriptor {
    /// Build a descriptor from already-rounded values.
    pub fn new(cell_size: (f64, f64), origin: (f64, f64), shape: (usize, usize)) -> Result<Self> {
        let (dx, dy) = cell_size;
        if !(dx.is_finite() && dx > 0.0) {
            return Err(LisError::invalid_metadata(DX_ATTR, format!("must be positive, got {}", dx)));
        }
        if !(dy.is_finite() && dy > 0.0) {
            return Err(LisError::invalid_metadata(DY_ATTR, format!("must be positive, got {}", dy)));
        }
        if !origin.0.is_finite() {
            return Err(LisError::invalid_metadata(SW_LON_ATTR, "not finite"));
        }
        if !origin.1.is_finite() {
            return Err(LisError::invalid_metadata(SW_LAT_ATTR, "not finite"));
        }

        let lon_axis = (0..shape.0).map(|i| origin.0 + i as f64 * dx).collect();
        let lat_axis = (0..shape.1).map(|j| origin.1 + j as f64 * dy).collect();

        Ok(Self {
            cell_size,
            origin,
            shape,
            lon_axis,
            lat_axis,
        })
    }

    /// Derive the grid from dataset attributes and native dimensions.
    pub fn from_dataset(dataset: &dyn GriddedDataset) -> Result<Self> {
        let attrs = dataset.attributes();
        let dx = required_attribute(attrs, DX_ATTR)?;
        let dy = required_attribute(attrs, DY_ATTR)?;
        let lat0 = required_attribute(attrs, SW_LAT_ATTR)?;
        let lon0 = required_attribute(attrs, SW_LON_ATTR)?;

        let nx = dataset
            .dimension_len(EAST_WEST_DIM)
            .ok_or_else(|| LisError::missing_metadata(EAST_WEST_DIM))?;
        let ny = dataset
            .dimension_len(NORTH_SOUTH_DIM)
            .ok_or_else(|| LisError::missing_metadata(NORTH_SOUTH_DIM))?;

        debug!(dx, dy, lon0, lat0, nx, ny, "Derived grid descriptor");
        Self::new((dx, dy), (lon0, lat0), (nx, ny))
    }

    /// Longitude axis, `nx` values.
    pub fn lon_axis(&self) -> &[f64] {
        &self.lon_axis
    }

    /// Latitude axis, `ny` values.
    pub fn lat_axis(&self) -> &[f64] {
        &self.lat_axis
    }

    /// Cell index containing a point. Not bounds-checked.
    ///
    /// Scaled coordinates within 1e-9 cells of an integer snap to it before
    /// flooring, so axis values map back to their own index. A point that
    /// close to a cell's west or south edge lands in that cell rather than
    /// its neighbor.
    pub fn geo_to_index(&self, point: &GeoPoint) -> GridIndex {
        let (dx, dy) = self.cell_size;
        let (lon0, lat0) = self.origin;
        GridIndex::new(
            floor_index((point.lon - lon0) / dx),
            floor_index((point.lat - lat0) / dy),
        )
    }

    /// Axis coordinates of a cell.
    pub fn index_to_geo(&self, index: &GridIndex) -> Result<GeoPoint> {
        let (ix, iy) = self.checked(index)?;
        Ok(GeoPoint::new(self.lon_axis[ix], self.lat_axis[iy]))
    }

    /// Cell whose axis values are closest to the point, bounds-checked.
    ///
    /// Unlike [`geo_to_index`](Self::geo_to_index) this rounds rather than
    /// floors, picking the nearest axis node on each axis. Any point inside
    /// [`bounds`](Self::bounds) resolves; points past the last node snap to
    /// it.
    pub fn nearest_index(&self, point: &GeoPoint) -> Result<GridIndex> {
        if !point.is_valid() {
            return Err(LisError::InvalidPoint(point.to_string()));
        }
        if !self.bounds().contains(point) {
            let index = self.geo_to_index(point);
            let (nx, ny) = self.shape;
            return Err(LisError::IndexOutOfRange {
                ix: index.ix,
                iy: index.iy,
                nx,
                ny,
            });
        }

        let (dx, dy) = self.cell_size;
        let (lon0, lat0) = self.origin;
        let (nx, ny) = self.shape;
        let index = GridIndex::new(
            nearest_node((point.lon - lon0) / dx, nx),
            nearest_node((point.lat - lat0) / dy, ny),
        );
        self.checked(&index)?;
        Ok(index)
    }

    /// Bounds check, returning native `usize` indices.
    pub fn checked(&self, index: &GridIndex) -> Result<(usize, usize)> {
        let (nx, ny) = self.shape;
        index.to_usize(nx, ny).ok_or(LisError::IndexOutOfRange {
            ix: index.ix,
            iy: index.iy,
            nx,
            ny,
        })
    }

    pub fn contains(&self, index: &GridIndex) -> bool {
        index.in_bounds(self.shape.0, self.shape.1)
    }

    /// Middle axis values, the initial tap location of the variable map.
    pub fn center(&self) -> Option<GeoPoint> {
        let lon = self.lon_axis.get(self.shape.0 / 2)?;
        let lat = self.lat_axis.get(self.shape.1 / 2)?;
        Some(GeoPoint::new(*lon, *lat))
    }

    /// Half-open extent `[origin, origin + n * cell)`.
    pub fn bounds(&self) -> GeoBounds {
        let (dx, dy) = self.cell_size;
        let (lon0, lat0) = self.origin;
        GeoBounds::new(
            lon0,
            lat0,
            lon0 + self.shape.0 as f64 * dx,
            lat0 + self.shape.1 as f64 * dy,
        )
    }
}

/// A dataset viewed through its derived geographic grid.
///
/// Dimensions are renamed `north_south` → `lat` and `east_west` → `lon`, and
/// any `lat`/`lon` variables shipped with the raw data are dropped in favor
/// of the computed axes.
pub struct GeoreferencedDataset {
    inner: Box<dyn GriddedDataset>,
    grid: GridDescriptor,
    dimensions: Vec<Dimension>,
    variables: Vec<VariableInfo>,
}

impl GeoreferencedDataset {
    pub fn new(inner: Box<dyn GriddedDataset>) -> Result<Self> {
        let grid = GridDescriptor::from_dataset(inner.as_ref())?;

        let dimensions = inner
            .dimensions()
            .iter()
            .map(|d| Dimension::new(rename_dim(&d.name), d.len))
            .collect();

        let variables = inner
            .variables()
            .iter()
            .filter(|v| v.name != LAT_DIM && v.name != LON_DIM)
            .map(|v| VariableInfo {
                name: v.name.clone(),
                dims: v.dims.iter().map(|d| rename_dim(d)).collect(),
                attributes: v.attributes.clone(),
            })
            .collect();

        Ok(Self {
            inner,
            grid,
            dimensions,
            variables,
        })
    }

    pub fn grid(&self) -> &GridDescriptor {
        &self.grid
    }

    /// Computed coordinate axis for `lat` or `lon`.
    pub fn coordinate(&self, name: &str) -> Option<&[f64]> {
        match name {
            LAT_DIM => Some(self.grid.lat_axis()),
            LON_DIM => Some(self.grid.lon_axis()),
            _ => None,
        }
    }
}

fn rename_dim(name: &str) -> String {
    match name {
        NORTH_SOUTH_DIM => LAT_DIM.to_string(),
        EAST_WEST_DIM => LON_DIM.to_string(),
        other => other.to_string(),
    }
}

impl GriddedDataset for GeoreferencedDataset {
    fn attributes(&self) -> &Map<String, Value> {
        self.inner.attributes()
    }

    fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    fn times(&self) -> Result<Vec<DateTime<Utc>>> {
        self.inner.times()
    }

    fn read_cell_series(&self, variable: &str, ix: usize, iy: usize) -> Result<Vec<f32>> {
        if self.variable(variable).is_none() {
            return Err(LisError::UnknownVariable(variable.to_string()));
        }
        self.inner.read_cell_series(variable, ix, iy)
    }

    fn read_time_slice(&self, variable: &str, t: usize) -> Result<Vec<f32>> {
        if self.variable(variable).is_none() {
            return Err(LisError::UnknownVariable(variable.to_string()));
        }
        self.inner.read_time_slice(variable, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::scenario_dataset;

    fn scenario_grid() -> GridDescriptor {
        GridDescriptor::new((0.25, 0.25), (-100.0, 30.0), (4, 4)).unwrap()
    }

    #[test]
    fn test_scenario_axes() {
        let grid = scenario_grid();
        assert_eq!(grid.lon_axis(), &[-100.0, -99.75, -99.5, -99.25]);
        assert_eq!(grid.lat_axis(), &[30.0, 30.25, 30.5, 30.75]);
    }

    #[test]
    fn test_scenario_point_to_index() {
        let grid = scenario_grid();
        let index = grid.geo_to_index(&GeoPoint::new(-99.8, 30.3));
        assert_eq!(index, GridIndex::new(0, 1));
    }

    #[test]
    fn test_geo_to_index_is_unchecked() {
        let grid = scenario_grid();
        let index = grid.geo_to_index(&GeoPoint::new(-101.0, 31.0));
        assert_eq!(index, GridIndex::new(-4, 4));
        assert!(!grid.contains(&index));
    }

    #[test]
    fn test_index_to_geo_bounds() {
        let grid = scenario_grid();
        assert_eq!(
            grid.index_to_geo(&GridIndex::new(3, 2)).unwrap(),
            GeoPoint::new(-99.25, 30.5)
        );
        assert!(matches!(
            grid.index_to_geo(&GridIndex::new(4, 0)),
            Err(LisError::IndexOutOfRange { ix: 4, iy: 0, .. })
        ));
        assert!(matches!(
            grid.index_to_geo(&GridIndex::new(0, -1)),
            Err(LisError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_round_trip_with_awkward_cell_size() {
        let grid = GridDescriptor::new((0.1, 0.3), (-105.55, 25.05), (37, 23)).unwrap();
        for ix in 0..37 {
            for iy in 0..23 {
                let index = GridIndex::new(ix, iy);
                let point = grid.index_to_geo(&index).unwrap();
                assert_eq!(grid.geo_to_index(&point), index);
            }
        }
    }

    #[test]
    fn test_nearest_index_rounds() {
        let grid = scenario_grid();
        assert_eq!(
            grid.nearest_index(&GeoPoint::new(-99.8, 30.3)).unwrap(),
            GridIndex::new(1, 1)
        );
        assert!(matches!(
            grid.nearest_index(&GeoPoint::new(-98.0, 30.3)),
            Err(LisError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            grid.nearest_index(&GeoPoint::new(f64::NAN, 30.3)),
            Err(LisError::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_nearest_index_last_cell() {
        let grid = scenario_grid();
        let point = GeoPoint::new(-99.1, 30.9);
        assert!(grid.bounds().contains(&point));
        assert_eq!(grid.nearest_index(&point).unwrap(), GridIndex::new(3, 3));

        // Just inside the far corner, and the south-west corner itself
        assert_eq!(
            grid.nearest_index(&GeoPoint::new(-99.0001, 30.9999)).unwrap(),
            GridIndex::new(3, 3)
        );
        assert_eq!(
            grid.nearest_index(&GeoPoint::new(-100.0, 30.0)).unwrap(),
            GridIndex::new(0, 0)
        );

        // The far edges themselves are outside
        assert!(matches!(
            grid.nearest_index(&GeoPoint::new(-99.0, 30.5)),
            Err(LisError::IndexOutOfRange { ix: 4, iy: 2, .. })
        ));
        assert!(matches!(
            grid.nearest_index(&GeoPoint::new(-100.1, 30.5)),
            Err(LisError::IndexOutOfRange { ix: -1, .. })
        ));
    }

    #[test]
    fn test_center_and_bounds() {
        let grid = scenario_grid();
        assert_eq!(grid.center(), Some(GeoPoint::new(-99.5, 30.5)));

        let bounds = grid.bounds();
        assert_eq!(bounds, GeoBounds::new(-100.0, 30.0, -99.0, 31.0));
        assert!(!bounds.contains(&GeoPoint::new(-99.0, 30.5)));
    }

    #[test]
    fn test_attributes_rounded() {
        let ds = scenario_dataset()
            .unwrap()
            .with_attribute(DX_ATTR, serde_json::json!(0.2500001))
            .with_attribute(SW_LON_ATTR, serde_json::json!("-100.0004"));
        let grid = GridDescriptor::from_dataset(&ds).unwrap();
        assert_eq!(grid.cell_size.0, 0.25);
        assert_eq!(grid.origin.0, -100.0);
    }

    #[test]
    fn test_missing_attribute() {
        let ds = scenario_dataset()
            .unwrap()
            .with_attribute(DY_ATTR, serde_json::Value::Null);
        assert!(matches!(
            GridDescriptor::from_dataset(&ds),
            Err(LisError::InvalidMetadata { .. })
        ));

        let bare = crate::dataset::MemoryDataset::new(vec![], 4, 4)
            .with_attribute(DX_ATTR, serde_json::json!(0.25))
            .with_attribute(DY_ATTR, serde_json::json!(0.25))
            .with_attribute(SW_LAT_ATTR, serde_json::json!(30.0));
        match GridDescriptor::from_dataset(&bare) {
            Err(LisError::MissingMetadata(key)) => assert_eq!(key, SW_LON_ATTR),
            other => panic!("expected missing metadata, got {:?}", other.map(|g| g.shape)),
        }
    }

    #[test]
    fn test_non_positive_cell_size_rejected() {
        assert!(GridDescriptor::new((0.0, 0.25), (0.0, 0.0), (2, 2)).is_err());
        assert!(GridDescriptor::new((0.25, -0.25), (0.0, 0.0), (2, 2)).is_err());
    }

    #[test]
    fn test_georeferenced_view_renames() {
        let ds = GeoreferencedDataset::new(Box::new(scenario_dataset().unwrap())).unwrap();

        let dims: Vec<&str> = ds.dimensions().iter().map(|d| d.name.as_str()).collect();
        assert!(dims.contains(&"lat"));
        assert!(dims.contains(&"lon"));
        assert!(!dims.contains(&"north_south"));

        assert!(ds.variable("lat").is_none());
        assert!(ds.variable("lon").is_none());
        let flow = ds.variable("Streamflow_tavg").unwrap();
        assert_eq!(flow.dims, vec!["time", "lat", "lon"]);

        assert_eq!(ds.coordinate("lon").unwrap().len(), 4);
        assert!(ds.coordinate("time").is_none());
        assert!(matches!(
            ds.read_cell_series("lat", 0, 0),
            Err(LisError::UnknownVariable(_))
        ));
    }
}
