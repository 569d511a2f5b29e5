//! Caches for extracted data.

mod series_cache;

pub use series_cache::{SeriesCache, SeriesKey};
