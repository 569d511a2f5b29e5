//! Model-versus-gage comparison for LIS routing output.
//!
//! Builds on `lis-grid` to answer the interactive question "how does the
//! simulated streamflow at this gage compare with what was observed?"
//!
//! # Architecture
//!
//! ```text
//! gage header + data files ──► ingest ──► GageCatalog
//!                                             │ select(index)
//!                                             ▼
//! DatasetStore ──► GeoreferencedDataset ──► SeriesExtractor::extract(var, gage point)
//!                                             │
//!                                             ▼
//!                                   TemporalAligner::align(model, observed)
//!                                             │
//!                                             ├─► first non-empty pair shapes the
//!                                             │   NullPlaceholder ("No Gages")
//!                                             ▼
//!                                        dyn Renderer
//! ```
//!
//! [`ExplorationSession`] wires these together per user. [`Environment`]
//! carries the directories that used to be process-wide state.

pub mod aligner;
pub mod catalog;
pub mod config;
pub mod environment;
pub mod ingest;
pub mod render;
pub mod session;

pub use aligner::{align, AlignedPair, NullPlaceholder, TemporalAligner};
pub use catalog::{GageCatalog, GageRecord};
pub use config::{ExplorerConfig, GageFileConfig, GraphStyle, LogFormat, MapStyle};
pub use environment::Environment;
pub use ingest::{read_gage_header, read_gage_series, scan_gage_dir, HeaderRow};
pub use render::{Renderer, VariableMap};
pub use session::{ExplorationSession, NO_GAGES_TITLE};
