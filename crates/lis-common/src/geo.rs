//! Geographic points and grid indices.
//!
//! Both live in the same unprojected lon/lat frame as the model grid; no
//! datum transformation is ever applied.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Both coordinates are finite numbers.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Squared Euclidean distance in (lon, lat) space.
    ///
    /// No geodesic correction: cells in the covered region are near-uniform,
    /// and nearest-point results depend on this exact metric.
    pub fn distance_sq(&self, other: &GeoPoint) -> f64 {
        let dx = self.lon - other.lon;
        let dy = self.lat - other.lat;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &GeoPoint) -> f64 {
        self.distance_sq(other).sqrt()
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self { lon, lat }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(lon={}, lat={})", self.lon, self.lat)
    }
}

/// A cell position in the grid's native index space.
///
/// Signed because `geo_to_index` deliberately returns raw indices for points
/// outside the grid; bounds checking is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    /// Column along `east_west` (longitude).
    pub ix: i64,
    /// Row along `north_south` (latitude).
    pub iy: i64,
}

impl GridIndex {
    pub fn new(ix: i64, iy: i64) -> Self {
        Self { ix, iy }
    }

    /// Whether the index lies in `[0, nx) x [0, ny)`.
    pub fn in_bounds(&self, nx: usize, ny: usize) -> bool {
        self.ix >= 0 && self.iy >= 0 && (self.ix as u64) < nx as u64 && (self.iy as u64) < ny as u64
    }

    /// The index as unsigned offsets, if in bounds.
    pub fn to_usize(&self, nx: usize, ny: usize) -> Option<(usize, usize)> {
        if self.in_bounds(nx, ny) {
            Some((self.ix as usize, self.iy as usize))
        } else {
            None
        }
    }
}

impl From<(i64, i64)> for GridIndex {
    fn from((ix, iy): (i64, i64)) -> Self {
        Self { ix, iy }
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.ix, self.iy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_validity() {
        assert!(GeoPoint::new(-99.8, 30.3).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 30.3).is_valid());
        assert!(!GeoPoint::new(-99.8, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_distance() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < f64::EPSILON);
        assert!((a.distance_sq(&b) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_index_bounds() {
        assert!(GridIndex::new(0, 0).in_bounds(4, 4));
        assert!(GridIndex::new(3, 3).in_bounds(4, 4));
        assert!(!GridIndex::new(4, 0).in_bounds(4, 4));
        assert!(!GridIndex::new(-1, 2).in_bounds(4, 4));
        assert_eq!(GridIndex::new(2, 1).to_usize(4, 4), Some((2, 1)));
        assert_eq!(GridIndex::new(2, 9).to_usize(4, 4), None);
    }
}
