//! Coordinate reconciliation and spatial indexing for LIS routing grids.
//!
//! LIS writes its output on a native index space (`east_west`,
//! `north_south`) described only by a handful of global attributes. This
//! crate turns that into a geographic grid and answers point queries
//! against it:
//!
//! - **Georeferencing**: derive half-open lat/lon axes from `DX`, `DY` and
//!   the south-west corner, and convert between points and cell indices
//! - **Nearest point**: closest candidate in (lon, lat) space, for matching
//!   gages that do not sit on grid nodes
//! - **Extraction**: pull a single cell's time series with provenance
//!
//! # Architecture
//!
//! ```text
//! DatasetStore::open_dataset(locator)
//!      │
//!      ▼
//! GeoreferencedDataset::new(raw)
//!      │
//!      ├─► GridDescriptor::from_dataset (DX, DY, SW corner, dims)
//!      │
//!      └─► rename north_south → lat, east_west → lon
//!               │
//!               ▼
//! SeriesExtractor::extract(variable, point)
//!      │
//!      ├─► geo_to_index + bounds check
//!      │
//!      ├─► SeriesCache hit? return cached series
//!      │
//!      └─► read cell, drop missing values, tag provenance
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lis_grid::{DatasetLocator, DatasetStore, GeoreferencedDataset, SeriesExtractor, ZarrDatasetStore};
//! use lis_common::GeoPoint;
//!
//! let store = ZarrDatasetStore::new("/data/lis");
//! let raw = store.open_dataset(&DatasetLocator::object("eis-dh-hydro", "LIS/ROUTING"))?;
//! let mut extractor = SeriesExtractor::new(GeoreferencedDataset::new(raw)?)?;
//!
//! let series = extractor.extract("Streamflow_tavg", GeoPoint::new(-99.8, 30.3))?;
//! ```

pub mod cache;
pub mod dataset;
pub mod extract;
pub mod georef;
pub mod nearest;
pub mod testdata;
pub mod types;

// Re-export commonly used types at crate root
pub use cache::{SeriesCache, SeriesKey};
pub use dataset::{
    DatasetLocator, DatasetStore, Dimension, GriddedDataset, MemoryDataset, MemoryDatasetStore,
    VariableInfo, ZarrDataset, ZarrDatasetStore,
};
pub use extract::{list_available_variables, Location, SeriesExtractor};
pub use georef::{GeoreferencedDataset, GridDescriptor};
pub use nearest::NearestPointResolver;
pub use types::{CacheStats, GeoBounds, GridSnapshot};
