//! Rendering capability.
//!
//! The explorer computes series and fields; a [`Renderer`] owns all drawing.
//! Implementations receive fully computed data plus styling and never call
//! back into the session.

use lis_common::{GeoPoint, Result, TimeSeries};
use lis_grid::GridSnapshot;
use serde::Serialize;

use crate::aligner::AlignedPair;
use crate::config::{GraphStyle, MapStyle};

/// Everything a map view needs: the field, the gage layer and the initial
/// tap location.
#[derive(Debug, Clone, Serialize)]
pub struct VariableMap {
    pub snapshot: GridSnapshot,
    /// Finite value extent of the field, for color scaling.
    pub value_range: Option<(f32, f32)>,
    pub gages: Vec<GeoPoint>,
    pub center: Option<GeoPoint>,
}

pub trait Renderer {
    /// A single series, e.g. the model series under a tapped point.
    fn render_series(&mut self, series: &TimeSeries, title: &str, style: &GraphStyle) -> Result<()>;

    /// A model series against a gage series on shared timestamps.
    fn render_pair(&mut self, pair: &AlignedPair, title: &str, style: &GraphStyle) -> Result<()>;

    fn render_map(&mut self, map: &VariableMap, style: &MapStyle) -> Result<()>;
}
