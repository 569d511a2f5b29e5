//! Time series extraction from a georeferenced dataset.

use std::fmt;

use chrono::{DateTime, Utc};
use lis_common::{GeoPoint, GridIndex, LisError, Provenance, Result, TimeRange, TimeSeries};
use tracing::debug;

use crate::cache::{SeriesCache, SeriesKey};
use crate::dataset::GriddedDataset;
use crate::georef::GeoreferencedDataset;
use crate::types::{CacheStats, GridSnapshot};

/// Names of the variables offered for selection.
///
/// Only variables over exactly three dimensions (time and the two spatial
/// axes) qualify; static masks and layered fields are excluded. Order is
/// the dataset's declaration order.
pub fn list_available_variables(dataset: &dyn GriddedDataset) -> Vec<String> {
    dataset
        .variables()
        .iter()
        .filter(|v| v.ndim() == 3)
        .map(|v| v.name.clone())
        .collect()
}

/// A place to extract from: a native cell or a geographic point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location {
    Index(GridIndex),
    Point(GeoPoint),
}

impl From<GridIndex> for Location {
    fn from(index: GridIndex) -> Self {
        Self::Index(index)
    }
}

impl From<GeoPoint> for Location {
    fn from(point: GeoPoint) -> Self {
        Self::Point(point)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "cell {}", index),
            Self::Point(point) => write!(f, "point {}", point),
        }
    }
}

/// Pulls single-cell time series out of a georeferenced dataset.
pub struct SeriesExtractor {
    dataset: GeoreferencedDataset,
    times: Vec<DateTime<Utc>>,
    cache: Option<SeriesCache>,
}

impl SeriesExtractor {
    /// Wrap a dataset, decoding its time axis once.
    pub fn new(dataset: GeoreferencedDataset) -> Result<Self> {
        let times = dataset.times()?;
        debug!(steps = times.len(), "Loaded time axis");
        Ok(Self {
            dataset,
            times,
            cache: None,
        })
    }

    /// Keep up to `entries` extracted series in an LRU cache.
    pub fn with_cache(mut self, entries: usize) -> Self {
        self.cache = Some(SeriesCache::new(entries));
        self
    }

    pub fn dataset(&self) -> &GeoreferencedDataset {
        &self.dataset
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn list_available_variables(&self) -> Vec<String> {
        list_available_variables(&self.dataset)
    }

    /// Resolve a location to an in-bounds cell.
    pub fn resolve(&self, location: Location) -> Result<GridIndex> {
        let grid = self.dataset.grid();
        let index = match location {
            Location::Index(index) => index,
            Location::Point(point) => {
                if !point.is_valid() {
                    return Err(LisError::InvalidPoint(point.to_string()));
                }
                grid.geo_to_index(&point)
            }
        };
        grid.checked(&index)?;
        Ok(index)
    }

    /// Full time extent of one cell.
    ///
    /// Missing values (NaN or the variable's fill value) are dropped; a cell
    /// with no remaining values is an [`LisError::EmptySelection`].
    pub fn extract(&mut self, variable: &str, location: impl Into<Location>) -> Result<TimeSeries> {
        let location = location.into();
        let info = self
            .dataset
            .variable(variable)
            .ok_or_else(|| LisError::UnknownVariable(variable.to_string()))?;
        if info.ndim() != 3 {
            return Err(LisError::UnknownVariable(format!(
                "{} has {} dimensions, expected 3",
                variable,
                info.ndim()
            )));
        }
        let fill = info.fill_value();

        let index = self.resolve(location)?;
        let key: SeriesKey = (variable.to_string(), index.ix, index.iy);
        if let Some(cache) = self.cache.as_mut() {
            if let Some(series) = cache.get(&key) {
                debug!(variable, index = %index, "Series cache hit");
                return Ok(series.clone());
            }
        }

        let (ix, iy) = self.dataset.grid().checked(&index)?;
        let raw = self.dataset.read_cell_series(variable, ix, iy)?;
        if raw.len() != self.times.len() {
            return Err(LisError::storage(format!(
                "{} returned {} values for {} time steps",
                variable,
                raw.len(),
                self.times.len()
            )));
        }

        let points = self
            .times
            .iter()
            .zip(raw)
            .filter(|(_, v)| !is_missing(*v, fill))
            .map(|(t, v)| (*t, f64::from(v)));

        let cell = self.dataset.grid().index_to_geo(&index)?;
        let series = TimeSeries::from_points(Provenance::model(variable), points)?
            .with_location(cell)
            .with_grid_index(index);

        if series.is_empty() {
            return Err(LisError::empty_selection(variable, location));
        }

        debug!(variable, index = %index, points = series.len(), "Extracted series");
        if let Some(cache) = self.cache.as_mut() {
            cache.insert(key, series.clone());
        }
        Ok(series)
    }

    /// Like [`extract`](Self::extract) but restricted to `range`.
    pub fn extract_window(
        &mut self,
        variable: &str,
        location: impl Into<Location>,
        range: &TimeRange,
    ) -> Result<TimeSeries> {
        let location = location.into();
        let series = self.extract(variable, location)?.window(range);
        if series.is_empty() {
            return Err(LisError::empty_selection(
                variable,
                format!("{} within {}/{}", location, range.start, range.end),
            ));
        }
        Ok(series)
    }

    /// One time step of a variable over the whole grid.
    pub fn snapshot(&self, variable: &str, t: usize) -> Result<GridSnapshot> {
        let info = self
            .dataset
            .variable(variable)
            .ok_or_else(|| LisError::UnknownVariable(variable.to_string()))?;
        let fill = info.fill_value();
        let time = *self.times.get(t).ok_or_else(|| {
            LisError::parse(format!("time step {} outside axis of length {}", t, self.times.len()))
        })?;

        let data = self
            .dataset
            .read_time_slice(variable, t)?
            .into_iter()
            .map(|v| if is_missing(v, fill) { f32::NAN } else { v })
            .collect();

        let (width, height) = self.dataset.grid().shape;
        Ok(GridSnapshot {
            variable_name: variable.to_string(),
            time,
            data,
            width,
            height,
            bounds: self.dataset.grid().bounds(),
        })
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }
}

/// Fill values are compared at storage precision.
fn is_missing(value: f32, fill: Option<f64>) -> bool {
    value.is_nan() || fill.map_or(false, |f| value == f as f32)
}
