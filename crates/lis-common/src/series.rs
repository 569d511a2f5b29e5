//! Time series with provenance tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LisError, Result};
use crate::geo::{GeoPoint, GridIndex};
use crate::time::TimeRange;

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesSource {
    /// Extracted from a cell of the gridded model output.
    ModelGrid,
    /// Observed at a streamflow gage.
    GageObservation,
}

impl fmt::Display for SeriesSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelGrid => write!(f, "model-grid"),
            Self::GageObservation => write!(f, "gage-observation"),
        }
    }
}

/// Metadata carried alongside series data.
///
/// Renderers build titles from this tag alone and never go back to the
/// source dataset, so it must travel with every derived series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: SeriesSource,
    pub variable_name: String,
    /// Geographic location of the data (cell coordinates or gage position).
    pub location: Option<GeoPoint>,
    /// Native grid cell, for model series.
    pub grid_index: Option<GridIndex>,
    /// Gage identifier, for observation series.
    pub gage_id: Option<String>,
}

impl Provenance {
    pub fn model(variable_name: impl Into<String>) -> Self {
        Self {
            source: SeriesSource::ModelGrid,
            variable_name: variable_name.into(),
            location: None,
            grid_index: None,
            gage_id: None,
        }
    }

    pub fn gage(gage_id: impl Into<String>) -> Self {
        let gage_id = gage_id.into();
        Self {
            source: SeriesSource::GageObservation,
            variable_name: gage_id.clone(),
            location: None,
            grid_index: None,
            gage_id: Some(gage_id),
        }
    }
}

/// An ordered sequence of `(timestamp, value)` pairs.
///
/// Timestamps are strictly increasing; constructors enforce this.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    provenance: Provenance,
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from parallel timestamp and value vectors.
    pub fn new(
        provenance: Provenance,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(LisError::parse(format!(
                "series '{}' has {} timestamps but {} values",
                provenance.variable_name,
                timestamps.len(),
                values.len()
            )));
        }

        if let Some(pos) = timestamps.windows(2).position(|w| w[0] >= w[1]) {
            return Err(LisError::parse(format!(
                "series '{}' timestamps not strictly increasing at {}",
                provenance.variable_name,
                timestamps[pos + 1]
            )));
        }

        Ok(Self {
            provenance,
            timestamps,
            values,
        })
    }

    /// Build a series from `(timestamp, value)` pairs already in order.
    pub fn from_points(
        provenance: Provenance,
        points: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    ) -> Result<Self> {
        let (timestamps, values) = points.into_iter().unzip();
        Self::new(provenance, timestamps, values)
    }

    /// Build a series from pairs in any order.
    ///
    /// Pairs are sorted by time; on duplicate timestamps the last pair wins.
    /// Returns the series and the number of duplicates dropped.
    pub fn from_unsorted(
        provenance: Provenance,
        points: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    ) -> (Self, usize) {
        let mut points: Vec<(DateTime<Utc>, f64)> = points.into_iter().collect();
        // Stable sort keeps input order among equal timestamps
        points.sort_by_key(|(t, _)| *t);

        let mut timestamps: Vec<DateTime<Utc>> = Vec::with_capacity(points.len());
        let mut values: Vec<f64> = Vec::with_capacity(points.len());
        let mut duplicates = 0;

        for (t, v) in points {
            if timestamps.last() == Some(&t) {
                duplicates += 1;
                if let Some(last) = values.last_mut() {
                    *last = v;
                }
            } else {
                timestamps.push(t);
                values.push(v);
            }
        }

        (
            Self {
                provenance,
                timestamps,
                values,
            },
            duplicates,
        )
    }

    /// A series with no points.
    pub fn empty(provenance: Provenance) -> Self {
        Self {
            provenance,
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn source(&self) -> SeriesSource {
        self.provenance.source
    }

    pub fn variable_name(&self) -> &str {
        &self.provenance.variable_name
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at an exact timestamp.
    pub fn value_at(&self, time: &DateTime<Utc>) -> Option<f64> {
        self.timestamps
            .binary_search(time)
            .ok()
            .map(|i| self.values[i])
    }

    /// First and last timestamp, if any.
    pub fn time_range(&self) -> Option<TimeRange> {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(start), Some(end)) => Some(TimeRange::new(*start, *end)),
            _ => None,
        }
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.provenance.location = Some(location);
        self
    }

    pub fn with_grid_index(mut self, index: GridIndex) -> Self {
        self.provenance.grid_index = Some(index);
        self
    }

    /// Keep only the points whose timestamps appear in `times`.
    ///
    /// `times` must be strictly increasing. Timestamps missing from this
    /// series are skipped, so the result may be shorter than `times`.
    pub fn restrict_to(&self, times: &[DateTime<Utc>]) -> Self {
        let mut timestamps = Vec::with_capacity(times.len().min(self.len()));
        let mut values = Vec::with_capacity(times.len().min(self.len()));

        let (mut i, mut j) = (0, 0);
        while i < self.timestamps.len() && j < times.len() {
            match self.timestamps[i].cmp(&times[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    timestamps.push(self.timestamps[i]);
                    values.push(self.values[i]);
                    i += 1;
                    j += 1;
                }
            }
        }

        Self {
            provenance: self.provenance.clone(),
            timestamps,
            values,
        }
    }

    /// Points within `range`, inclusive at both ends.
    pub fn window(&self, range: &TimeRange) -> Self {
        let start = self.timestamps.partition_point(|t| t < &range.start);
        let end = self.timestamps.partition_point(|t| t <= &range.end);
        let end = end.max(start);

        Self {
            provenance: self.provenance.clone(),
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        }
    }

    /// Same provenance and timestamps, every value set to zero.
    pub fn zeroed(&self) -> Self {
        Self {
            provenance: self.provenance.clone(),
            timestamps: self.timestamps.clone(),
            values: vec![0.0; self.values.len()],
        }
    }

    /// Merge another series into this one.
    ///
    /// Points from `other` replace points at equal timestamps. Returns the
    /// merged series and the number of replaced points.
    pub fn merge(&self, other: &TimeSeries) -> (Self, usize) {
        Self::from_unsorted(
            self.provenance.clone(),
            self.iter().chain(other.iter()),
        )
    }

    /// Display title derived from provenance.
    pub fn title(&self) -> String {
        match (&self.provenance.source, &self.provenance.gage_id) {
            (SeriesSource::GageObservation, Some(id)) => format!("Gage[{}]", id),
            _ => self.provenance.variable_name.clone(),
        }
    }
}
