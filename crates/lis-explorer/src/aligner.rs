//! Temporal alignment of model and observed series.
//!
//! Alignment is strict: two points line up only when their timestamps are
//! equal. No interpolation or nearest-in-time matching is done.

use chrono::{DateTime, Utc};
use lis_common::{LisError, Result, TimeSeries};
use serde::Serialize;
use tracing::debug;

/// A model and an observed series over identical timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPair {
    pub model: TimeSeries,
    pub observed: TimeSeries,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.model.len()
    }

    /// `true` when the inputs had no timestamp in common.
    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        self.model.timestamps()
    }
}

/// Restrict both series to their common timestamps.
///
/// Disjoint inputs give an empty pair, which callers treat as "no overlap"
/// rather than as an error.
pub fn align(model: &TimeSeries, observed: &TimeSeries) -> AlignedPair {
    let common = intersect(model.timestamps(), observed.timestamps());
    debug!(
        model = model.len(),
        observed = observed.len(),
        common = common.len(),
        "Aligned series"
    );
    AlignedPair {
        model: model.restrict_to(&common),
        observed: observed.restrict_to(&common),
    }
}

/// Intersection of two strictly increasing timestamp sequences.
fn intersect(a: &[DateTime<Utc>], b: &[DateTime<Utc>]) -> Vec<DateTime<Utc>> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Zero-filled stand-in shown while nothing is selected.
///
/// Shaped like a real aligned pair so the view keeps consistent axes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NullPlaceholder {
    pub model: TimeSeries,
    pub observed: TimeSeries,
}

impl NullPlaceholder {
    fn from_pair(pair: &AlignedPair) -> Self {
        Self {
            model: pair.model.zeroed(),
            observed: pair.observed.zeroed(),
        }
    }

    pub fn len(&self) -> usize {
        self.model.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    pub fn as_pair(&self) -> AlignedPair {
        AlignedPair {
            model: self.model.clone(),
            observed: self.observed.clone(),
        }
    }
}

/// Aligner owning the lazily built null placeholder for one session.
///
/// The placeholder is taken from the first alignment that produced at
/// least one common timestamp and never rebuilt afterwards.
#[derive(Debug, Default)]
pub struct TemporalAligner {
    null: Option<NullPlaceholder>,
}

impl TemporalAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Align two series, remembering the shape of the first non-empty result.
    pub fn align(&mut self, model: &TimeSeries, observed: &TimeSeries) -> AlignedPair {
        let pair = align(model, observed);
        self.remember(&pair);
        pair
    }

    fn remember(&mut self, reference: &AlignedPair) {
        if self.null.is_none() && !reference.is_empty() {
            debug!(len = reference.len(), "Built null placeholder");
            self.null = Some(NullPlaceholder::from_pair(reference));
        }
    }

    /// Cached placeholder, building it from `reference` on first use.
    ///
    /// An empty `reference` cannot give the placeholder a shape, so until a
    /// non-empty pair has been seen this fails with
    /// [`LisError::NoReferenceAvailable`].
    pub fn get_or_build_null(&mut self, reference: &AlignedPair) -> Result<&NullPlaceholder> {
        self.remember(reference);
        self.null.as_ref().ok_or(LisError::NoReferenceAvailable)
    }

    /// The cached placeholder.
    pub fn null_placeholder(&self) -> Result<&NullPlaceholder> {
        self.null.as_ref().ok_or(LisError::NoReferenceAvailable)
    }

    pub fn has_reference(&self) -> bool {
        self.null.is_some()
    }

    /// Forget the placeholder, e.g. after the dataset is replaced.
    pub fn reset(&mut self) {
        self.null = None;
    }
}
