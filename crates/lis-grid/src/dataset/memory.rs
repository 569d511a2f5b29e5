//! In-memory gridded datasets.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lis_common::{LisError, Result};
use serde_json::{Map, Value};

use super::{
    CellAxes, DatasetLocator, DatasetStore, Dimension, GriddedDataset, VariableInfo,
    EAST_WEST_DIM, NORTH_SOUTH_DIM, TIME_DIM,
};

/// A dataset held entirely in memory, in LIS native layout.
///
/// Variable data is stored row-major in the order of its dimensions.
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    attributes: Map<String, Value>,
    dimensions: Vec<Dimension>,
    variables: Vec<VariableInfo>,
    data: HashMap<String, Vec<f32>>,
    times: Vec<DateTime<Utc>>,
}

impl MemoryDataset {
    /// Create an empty dataset with `time`, `north_south` and `east_west`
    /// dimensions.
    pub fn new(times: Vec<DateTime<Utc>>, nx: usize, ny: usize) -> Self {
        Self {
            attributes: Map::new(),
            dimensions: vec![
                Dimension::new(TIME_DIM, times.len()),
                Dimension::new(NORTH_SOUTH_DIM, ny),
                Dimension::new(EAST_WEST_DIM, nx),
            ],
            variables: Vec::new(),
            data: HashMap::new(),
            times,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Declare an extra dimension (e.g. soil layers).
    pub fn with_dimension(mut self, name: impl Into<String>, len: usize) -> Self {
        self.dimensions.push(Dimension::new(name, len));
        self
    }

    /// Add a variable over previously declared dimensions.
    pub fn with_variable(mut self, name: &str, dims: &[&str], data: Vec<f32>) -> Result<Self> {
        let expected = dims.iter().try_fold(1usize, |acc, d| {
            self.dimension_len(d)
                .map(|len| acc * len)
                .ok_or_else(|| LisError::parse(format!("variable {} uses unknown dimension {}", name, d)))
        })?;

        if data.len() != expected {
            return Err(LisError::parse(format!(
                "variable {} has {} values, dimensions {:?} need {}",
                name,
                data.len(),
                dims,
                expected
            )));
        }

        self.variables.retain(|v| v.name != name);
        self.variables.push(VariableInfo::new(name, dims));
        self.data.insert(name.to_string(), data);
        Ok(self)
    }

    /// Set an attribute on an existing variable.
    pub fn with_variable_attribute(mut self, name: &str, key: &str, value: Value) -> Result<Self> {
        let var = self
            .variables
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| LisError::UnknownVariable(name.to_string()))?;
        var.attributes.insert(key.to_string(), value);
        Ok(self)
    }

    /// Raw values of a variable.
    pub fn data(&self, name: &str) -> Option<&[f32]> {
        self.data.get(name).map(|v| v.as_slice())
    }

    fn strides(&self, var: &VariableInfo) -> Result<Vec<usize>> {
        let lens = var
            .dims
            .iter()
            .map(|d| {
                self.dimension_len(d)
                    .ok_or_else(|| LisError::parse(format!("unknown dimension {}", d)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut strides = vec![1usize; lens.len()];
        for i in (0..lens.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * lens[i + 1];
        }
        Ok(strides)
    }

    fn cell_variable(&self, name: &str) -> Result<(&VariableInfo, CellAxes, &[f32])> {
        let var = self
            .variable(name)
            .ok_or_else(|| LisError::UnknownVariable(name.to_string()))?;
        let axes = var.cell_axes()?;
        let data = self
            .data(name)
            .ok_or_else(|| LisError::UnknownVariable(name.to_string()))?;
        Ok((var, axes, data))
    }

    fn grid_shape(&self) -> (usize, usize) {
        (
            self.dimension_len(EAST_WEST_DIM).unwrap_or(0),
            self.dimension_len(NORTH_SOUTH_DIM).unwrap_or(0),
        )
    }
}

impl GriddedDataset for MemoryDataset {
    fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    fn times(&self) -> Result<Vec<DateTime<Utc>>> {
        Ok(self.times.clone())
    }

    fn read_cell_series(&self, variable: &str, ix: usize, iy: usize) -> Result<Vec<f32>> {
        let (var, axes, data) = self.cell_variable(variable)?;
        let (nx, ny) = self.grid_shape();
        if ix >= nx || iy >= ny {
            return Err(LisError::IndexOutOfRange {
                ix: ix as i64,
                iy: iy as i64,
                nx,
                ny,
            });
        }

        let strides = self.strides(var)?;
        let base = iy * strides[axes.lat] + ix * strides[axes.lon];
        Ok((0..self.times.len())
            .map(|t| data[base + t * strides[axes.time]])
            .collect())
    }

    fn read_time_slice(&self, variable: &str, t: usize) -> Result<Vec<f32>> {
        let (var, axes, data) = self.cell_variable(variable)?;
        if t >= self.times.len() {
            return Err(LisError::parse(format!(
                "time step {} outside axis of length {}",
                t,
                self.times.len()
            )));
        }

        let (nx, ny) = self.grid_shape();
        let strides = self.strides(var)?;
        let base = t * strides[axes.time];
        let mut out = Vec::with_capacity(nx * ny);
        for iy in 0..ny {
            for ix in 0..nx {
                out.push(data[base + iy * strides[axes.lat] + ix * strides[axes.lon]]);
            }
        }
        Ok(out)
    }
}

/// Store resolving locators to datasets registered in memory.
#[derive(Debug, Default)]
pub struct MemoryDatasetStore {
    datasets: HashMap<String, MemoryDataset>,
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locator: &DatasetLocator, dataset: MemoryDataset) {
        self.datasets.insert(locator.to_string(), dataset);
    }
}

impl DatasetStore for MemoryDatasetStore {
    fn open_dataset(&self, locator: &DatasetLocator) -> Result<Box<dyn GriddedDataset>> {
        self.datasets
            .get(&locator.to_string())
            .cloned()
            .map(|ds| Box::new(ds) as Box<dyn GriddedDataset>)
            .ok_or_else(|| LisError::storage(format!("dataset not found: {}", locator)))
    }
}
