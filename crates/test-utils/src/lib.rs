//! Shared test utilities for the LIS explorer workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Series generators with predictable values
//! - Gage header and data file fixtures written to temp directories
//! - Approximate equality macros
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, date, model_series, GageFixture};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Assert two numbers agree within `epsilon`, comparing as `f64`.
///
/// ```ignore
/// assert_approx_eq!(series.values()[1], 11.1, 1e-5);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: {} ≈ {}\n  left: {:?}\n right: {:?}\n  diff: {:?} > {:?}",
                stringify!($left),
                stringify!($right),
                left,
                right,
                diff,
                epsilon
            );
        }
    }};
}

/// Assert a [`GeoPoint`](lis_common::GeoPoint) lies within `epsilon`
/// degrees of `(lon, lat)` on both axes.
///
/// ```ignore
/// assert_point_approx_eq!(grid.index_to_geo(&index)?, (-99.75, 30.25), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_point_approx_eq {
    ($point:expr, ($lon:expr, $lat:expr), $epsilon:expr) => {{
        let point = $point;
        $crate::assert_approx_eq!(point.lon, $lon, $epsilon);
        $crate::assert_approx_eq!(point.lat, $lat, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    use lis_common::GeoPoint;

    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(30.250001_f32, 30.25, 1e-5);
        assert_approx_eq!(-99.8, -99.8, 0.0);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(0.3, 0.25, 0.01);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 0.0, 1.0);
    }

    #[test]
    fn test_assert_point_approx_eq() {
        assert_point_approx_eq!(GeoPoint::new(-99.7500001, 30.25), (-99.75, 30.25), 1e-6);
    }
}
