//! Zarr-backed datasets in the xarray layout.
//!
//! A LIS Zarr store is a root group holding the global attributes, with one
//! array per variable. Each array names its dimensions in the
//! `_ARRAY_DIMENSIONS` attribute; the `time` array carries CF `units`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lis_common::{LisError, Result, TimeUnits};
use serde_json::{Map, Value};
use tracing::{debug, info};
use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs::group::Group;
use zarrs::storage::ReadableStorageTraits;
use zarrs_filesystem::FilesystemStore;

use super::{
    CellAxes, DatasetLocator, DatasetStore, Dimension, GriddedDataset, VariableInfo, TIME_DIM,
};

/// Attribute holding the dimension names of an array.
pub const ARRAY_DIMENSIONS_ATTR: &str = "_ARRAY_DIMENSIONS";
/// Optional root attribute listing variables in declaration order.
pub const VARIABLES_ATTR: &str = "variables";

/// A dataset read lazily from a Zarr hierarchy.
pub struct ZarrDataset<S: ReadableStorageTraits + ?Sized + 'static> {
    attributes: Map<String, Value>,
    dimensions: Vec<Dimension>,
    variables: Vec<VariableInfo>,
    arrays: HashMap<String, Array<S>>,
}

impl<S: ReadableStorageTraits + ?Sized + 'static> ZarrDataset<S> {
    /// Open the root group and the named variable arrays.
    pub fn open_with_variables(storage: Arc<S>, names: &[String]) -> Result<Self> {
        let group = Group::open(storage.clone(), "/")
            .map_err(|e| LisError::storage(format!("failed to open root group: {}", e)))?;
        let attributes = group.attributes().clone();

        let mut dimensions: Vec<Dimension> = Vec::new();
        let mut variables = Vec::with_capacity(names.len());
        let mut arrays = HashMap::with_capacity(names.len());

        for name in names {
            let array = Array::open(storage.clone(), &format!("/{}", name))
                .map_err(|e| LisError::storage(format!("failed to open array {}: {}", name, e)))?;

            let shape = array.shape().to_vec();
            let dims = array_dimensions(name, array.attributes(), shape.len())?;

            for (dim, len) in dims.iter().zip(shape.iter()) {
                match dimensions.iter().find(|d| &d.name == dim) {
                    Some(existing) if existing.len != *len as usize => {
                        return Err(LisError::invalid_metadata(
                            dim.clone(),
                            format!(
                                "length {} in {} conflicts with {}",
                                len, name, existing.len
                            ),
                        ));
                    }
                    Some(_) => {}
                    None => dimensions.push(Dimension::new(dim.clone(), *len as usize)),
                }
            }

            let mut info = VariableInfo {
                name: name.clone(),
                dims,
                attributes: array.attributes().clone(),
            };
            info.attributes.remove(ARRAY_DIMENSIONS_ATTR);

            debug!(variable = %name, shape = ?shape, "Opened Zarr variable");
            variables.push(info);
            arrays.insert(name.clone(), array);
        }

        Ok(Self {
            attributes,
            dimensions,
            variables,
            arrays,
        })
    }

    fn array(&self, name: &str) -> Result<&Array<S>> {
        self.arrays
            .get(name)
            .ok_or_else(|| LisError::UnknownVariable(name.to_string()))
    }

    fn cell_variable(&self, name: &str) -> Result<(&Array<S>, CellAxes)> {
        let var = self
            .variable(name)
            .ok_or_else(|| LisError::UnknownVariable(name.to_string()))?;
        let axes = var.cell_axes()?;
        Ok((self.array(name)?, axes))
    }

    fn read_subset(&self, name: &str, subset: &ArraySubset) -> Result<Vec<f64>> {
        let array = self.array(name)?;
        let read_err = |e: zarrs::array::ArrayError| {
            LisError::storage(format!("failed to read {}: {}", name, e))
        };

        let values = match array.data_type() {
            DataType::Float32 => array
                .retrieve_array_subset_elements::<f32>(subset)
                .map_err(read_err)?
                .into_iter()
                .map(f64::from)
                .collect(),
            DataType::Float64 => array
                .retrieve_array_subset_elements::<f64>(subset)
                .map_err(read_err)?,
            DataType::Int32 => array
                .retrieve_array_subset_elements::<i32>(subset)
                .map_err(read_err)?
                .into_iter()
                .map(f64::from)
                .collect(),
            DataType::Int64 => array
                .retrieve_array_subset_elements::<i64>(subset)
                .map_err(read_err)?
                .into_iter()
                .map(|v| v as f64)
                .collect(),
            other => {
                return Err(LisError::storage(format!(
                    "unsupported data type for {}: {:?}",
                    name, other
                )))
            }
        };
        Ok(values)
    }
}

impl ZarrDataset<FilesystemStore> {
    /// Open a Zarr store on the local filesystem, discovering its variables.
    pub fn open_path(path: &Path) -> Result<Self> {
        let storage = Arc::new(
            FilesystemStore::new(path)
                .map_err(|e| LisError::storage(format!("{}: {}", path.display(), e)))?,
        );
        let group = Group::open(storage.clone(), "/")
            .map_err(|e| LisError::storage(format!("{}: {}", path.display(), e)))?;

        let names = match group.attributes().get(VARIABLES_ATTR) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        LisError::invalid_metadata(VARIABLES_ATTR, "entries must be strings")
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(LisError::invalid_metadata(
                    VARIABLES_ATTR,
                    "expected a list of variable names",
                ))
            }
            None => discover_arrays(path)?,
        };

        Self::open_with_variables(storage, &names)
    }
}

impl<S: ReadableStorageTraits + ?Sized + 'static> GriddedDataset for ZarrDataset<S>
where
    Array<S>: Send + Sync,
{
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
        let var = self
            .variable(TIME_DIM)
            .ok_or_else(|| LisError::missing_metadata("time coordinate"))?;
        let units = var
            .units()
            .ok_or_else(|| LisError::missing_metadata("time units"))
            .and_then(TimeUnits::parse)?;

        let len = self.array(TIME_DIM)?.shape()[0];
        let subset = subset(vec![0], vec![len])?;
        self.read_subset(TIME_DIM, &subset)?
            .into_iter()
            .map(|offset| units.decode(offset))
            .collect()
    }

    fn read_cell_series(&self, variable: &str, ix: usize, iy: usize) -> Result<Vec<f32>> {
        let (array, axes) = self.cell_variable(variable)?;
        let shape = array.shape();
        let (nx, ny) = (shape[axes.lon] as usize, shape[axes.lat] as usize);
        if ix >= nx || iy >= ny {
            return Err(LisError::IndexOutOfRange {
                ix: ix as i64,
                iy: iy as i64,
                nx,
                ny,
            });
        }

        let mut start = vec![0u64; 3];
        let mut extent = vec![1u64; 3];
        start[axes.lon] = ix as u64;
        start[axes.lat] = iy as u64;
        extent[axes.time] = shape[axes.time];

        let values = self.read_subset(variable, &subset(start, extent)?)?;
        Ok(values.into_iter().map(|v| v as f32).collect())
    }

    fn read_time_slice(&self, variable: &str, t: usize) -> Result<Vec<f32>> {
        let (array, axes) = self.cell_variable(variable)?;
        let shape = array.shape().to_vec();
        if t as u64 >= shape[axes.time] {
            return Err(LisError::parse(format!(
                "time step {} outside axis of length {}",
                t, shape[axes.time]
            )));
        }

        let mut start = vec![0u64; 3];
        let mut extent = shape.clone();
        start[axes.time] = t as u64;
        extent[axes.time] = 1;

        let values = self.read_subset(variable, &subset(start, extent)?)?;
        let (nx, ny) = (shape[axes.lon] as usize, shape[axes.lat] as usize);
        if axes.lat < axes.lon {
            return Ok(values.into_iter().map(|v| v as f32).collect());
        }

        // Stored lon-major: transpose to rows of latitude
        let mut out = vec![f32::NAN; nx * ny];
        for ix in 0..nx {
            for iy in 0..ny {
                out[iy * nx + ix] = values[ix * ny + iy] as f32;
            }
        }
        Ok(out)
    }
}

/// Dimension names of an array, defaulting 1-D arrays to their own name.
fn array_dimensions(name: &str, attrs: &Map<String, Value>, ndim: usize) -> Result<Vec<String>> {
    match attrs.get(ARRAY_DIMENSIONS_ATTR) {
        Some(Value::Array(items)) => {
            let dims = items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    LisError::invalid_metadata(ARRAY_DIMENSIONS_ATTR, format!("{}: names must be strings", name))
                })?;
            if dims.len() != ndim {
                return Err(LisError::invalid_metadata(
                    ARRAY_DIMENSIONS_ATTR,
                    format!("{}: {} names for {} dimensions", name, dims.len(), ndim),
                ));
            }
            Ok(dims)
        }
        _ if ndim == 1 => Ok(vec![name.to_string()]),
        _ => Err(LisError::missing_metadata(format!(
            "{} on {}",
            ARRAY_DIMENSIONS_ATTR, name
        ))),
    }
}

/// Array names under a store root, in lexical order.
fn discover_arrays(path: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        if entry.path().join("zarr.json").is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn subset(start: Vec<u64>, shape: Vec<u64>) -> Result<ArraySubset> {
    ArraySubset::new_with_start_shape(start, shape)
        .map_err(|e| LisError::storage(format!("invalid subset: {}", e)))
}

/// Opens Zarr datasets below a root directory.
///
/// Object locators resolve to `{root}/{bucket}/{key}.zarr`; relative path
/// locators resolve against the root.
#[derive(Debug, Clone)]
pub struct ZarrDatasetStore {
    root: PathBuf,
}

impl ZarrDatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, locator: &DatasetLocator) -> PathBuf {
        match locator {
            DatasetLocator::Path(path) if path.is_absolute() => path.clone(),
            other => self.root.join(other.relative_path()),
        }
    }
}

impl DatasetStore for ZarrDatasetStore {
    fn open_dataset(&self, locator: &DatasetLocator) -> Result<Box<dyn GriddedDataset>> {
        let path = self.resolve(locator);
        if !path.is_dir() {
            return Err(LisError::storage(format!(
                "dataset not found: {} ({})",
                locator,
                path.display()
            )));
        }

        let dataset = ZarrDataset::open_path(&path)?;
        info!(
            locator = %locator,
            variables = dataset.variables().len(),
            "Opened Zarr dataset"
        );
        Ok(Box::new(dataset))
    }
}
