//! In-memory catalog of streamflow gages.

use std::collections::HashMap;
use std::path::Path;

use lis_common::{GeoPoint, LisError, Provenance, Result, TimeSeries};
use lis_grid::NearestPointResolver;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::GageFileConfig;
use crate::ingest::{read_gage_header, read_gage_series};

/// A gage and its observations.
///
/// Identity (`id`, `lon`, `lat`) is fixed at creation; only the
/// observation series grows.
#[derive(Debug, Clone, Serialize)]
pub struct GageRecord {
    id: String,
    location: GeoPoint,
    /// Extra header columns kept from ingestion.
    attributes: Vec<String>,
    observations: TimeSeries,
}

impl GageRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn lon(&self) -> f64 {
        self.location.lon
    }

    pub fn lat(&self) -> f64 {
        self.location.lat
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn observations(&self) -> &TimeSeries {
        &self.observations
    }
}

/// Gages in insertion order, addressable by id or position.
///
/// Positions are what interactive selection hands back, so insertion order
/// is stable for the life of the catalog. Adding an id that is already
/// present is rejected.
#[derive(Debug, Default)]
pub struct GageCatalog {
    records: Vec<GageRecord>,
    index: HashMap<String, usize>,
}

impl GageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a gage. The series is re-tagged as this gage's observations.
    pub fn add_gage(&mut self, id: &str, lon: f64, lat: f64, series: TimeSeries) -> Result<&GageRecord> {
        self.add_gage_with_attributes(id, lon, lat, Vec::new(), series)
    }

    pub fn add_gage_with_attributes(
        &mut self,
        id: &str,
        lon: f64,
        lat: f64,
        attributes: Vec<String>,
        series: TimeSeries,
    ) -> Result<&GageRecord> {
        if self.index.contains_key(id) {
            return Err(LisError::DuplicateGage(id.to_string()));
        }

        let location = GeoPoint::new(lon, lat);
        let observations = retag(id, location, &series);
        let position = self.records.len();
        self.records.push(GageRecord {
            id: id.to_string(),
            location,
            attributes,
            observations,
        });
        self.index.insert(id.to_string(), position);
        Ok(&self.records[position])
    }

    /// Merge more observations into an existing gage.
    ///
    /// Points at timestamps already present are replaced by the new data.
    /// Returns the number of replaced points.
    pub fn append_observations(&mut self, id: &str, series: &TimeSeries) -> Result<usize> {
        let position = *self
            .index
            .get(id)
            .ok_or_else(|| LisError::UnknownGage(id.to_string()))?;
        let record = &mut self.records[position];

        let (merged, replaced) = record.observations.merge(series);
        if replaced > 0 {
            warn!(gage = id, replaced, "Replaced observations at duplicate timestamps");
        }
        record.observations = merged;
        Ok(replaced)
    }

    pub fn get(&self, id: &str) -> Result<&GageRecord> {
        self.index
            .get(id)
            .map(|&i| &self.records[i])
            .ok_or_else(|| LisError::UnknownGage(id.to_string()))
    }

    pub fn get_coords(&self, id: &str) -> Result<GeoPoint> {
        self.get(id).map(|r| r.location)
    }

    /// Gage at a position in insertion order.
    pub fn select(&self, index: usize) -> Result<&GageRecord> {
        self.records.get(index).ok_or(LisError::GageIndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    /// Position of a gage id in insertion order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Locations in insertion order, for the map layer and nearest lookup.
    pub fn points(&self) -> Vec<GeoPoint> {
        self.records.iter().map(|r| r.location).collect()
    }

    /// Gage closest to a point.
    pub fn nearest_gage(&self, point: &GeoPoint) -> Result<&GageRecord> {
        let i = NearestPointResolver::new().nearest(point, &self.points())?;
        Ok(&self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &GageRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Build a catalog from a header file and per-gage data files.
    ///
    /// Gages without a data file get an empty series. A data file whose id
    /// is missing from the header fails with [`LisError::UnknownGage`].
    pub fn load<P: AsRef<Path>>(header: &Path, data_files: &[P], config: &GageFileConfig) -> Result<Self> {
        let mut catalog = Self::new();
        for row in read_gage_header(header, config)? {
            catalog.add_gage_with_attributes(
                &row.id,
                row.lon,
                row.lat,
                row.attributes,
                TimeSeries::empty(Provenance::gage(&row.id)),
            )?;
        }

        for path in data_files {
            let (id, series) = read_gage_series(path.as_ref(), config)?;
            catalog.append_observations(&id, &series)?;
        }

        info!(
            header = %header.display(),
            gages = catalog.len(),
            files = data_files.len(),
            "Loaded gage catalog"
        );
        Ok(catalog)
    }
}

fn retag(id: &str, location: GeoPoint, series: &TimeSeries) -> TimeSeries {
    let (tagged, _) = TimeSeries::from_unsorted(Provenance::gage(id), series.iter());
    tagged.with_location(location)
}
