//! Common types and utilities shared across the LIS exploration crates.

pub mod error;
pub mod geo;
pub mod series;
pub mod time;

pub use error::{LisError, Result};
pub use geo::{GeoPoint, GridIndex};
pub use series::{Provenance, SeriesSource, TimeSeries};
pub use time::{parse_timestamp, TimeRange, TimeUnits};
