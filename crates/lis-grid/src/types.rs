//! Core types for grid access.

use chrono::{DateTime, Utc};
use lis_common::GeoPoint;
use serde::{Deserialize, Serialize};

/// Geographic extent of a grid.
///
/// Half-open on the upper side: `max_lon`/`max_lat` are the far corner of
/// the last cell and do not belong to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Check if a point falls inside, excluding the upper edges.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lon >= self.min_lon
            && point.lon < self.max_lon
            && point.lat >= self.min_lat
            && point.lat < self.max_lat
    }
}

/// One time step of a variable over the whole grid, for the map view.
#[derive(Debug, Clone, Serialize)]
pub struct GridSnapshot {
    pub variable_name: String,
    pub time: DateTime<Utc>,
    /// Values in row-major order, south row first.
    pub data: Vec<f32>,
    /// Number of columns (longitude).
    pub width: usize,
    /// Number of rows (latitude).
    pub height: usize,
    pub bounds: GeoBounds,
}

impl GridSnapshot {
    /// Smallest and largest finite value, for color scaling.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Statistics about the series cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
}
