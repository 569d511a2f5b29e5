//! Explicit environment services.
//!
//! Built once at startup from [`ExplorerConfig`] and handed to whatever needs
//! the cache directory, the data root or scratch space.

use std::fs;
use std::path::{Path, PathBuf};

use lis_common::{LisError, Result};
use lis_grid::{DatasetLocator, ZarrDatasetStore};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::ExplorerConfig;

/// Directories used by a running explorer.
///
/// The scratch directory is removed when the environment is dropped.
#[derive(Debug)]
pub struct Environment {
    cache_dir: PathBuf,
    data_dir: PathBuf,
    scratch: TempDir,
}

impl Environment {
    /// Create the cache and data directories if needed and a fresh scratch
    /// directory.
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        fs::create_dir_all(&config.cache_dir).map_err(|e| {
            LisError::storage(format!("cannot create cache dir {}: {}", config.cache_dir.display(), e))
        })?;
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            LisError::storage(format!("cannot create data dir {}: {}", config.data_dir.display(), e))
        })?;

        let scratch = tempfile::Builder::new()
            .prefix("lis-scratch-")
            .tempdir_in(&config.cache_dir)?;

        info!(
            cache_dir = %config.cache_dir.display(),
            data_dir = %config.data_dir.display(),
            scratch_dir = %scratch.path().display(),
            "Environment ready"
        );

        Ok(Self {
            cache_dir: config.cache_dir.clone(),
            data_dir: config.data_dir.clone(),
            scratch,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Local path of a dataset under the data directory.
    pub fn resolve(&self, locator: &DatasetLocator) -> PathBuf {
        let path = self.dataset_store().resolve(locator);
        debug!(locator = %locator, path = %path.display(), "Resolved dataset locator");
        path
    }

    /// Filesystem store rooted at the data directory.
    pub fn dataset_store(&self) -> ZarrDatasetStore {
        ZarrDatasetStore::new(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path) -> ExplorerConfig {
        ExplorerConfig {
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
            ..Default::default()
        }
    }

    #[test]
    fn test_creates_directories() {
        let root = TempDir::new().unwrap();
        let env = Environment::new(&config(root.path())).unwrap();

        assert!(env.cache_dir().is_dir());
        assert!(env.data_dir().is_dir());
        assert!(env.scratch_dir().starts_with(env.cache_dir()));
    }

    #[test]
    fn test_scratch_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let env = Environment::new(&config(root.path())).unwrap();
        let scratch = env.scratch_dir().to_path_buf();
        fs::write(scratch.join("partial.bin"), b"x").unwrap();

        drop(env);
        assert!(!scratch.exists());
        assert!(root.path().join("cache").is_dir());
    }

    #[test]
    fn test_resolve_object_locator() {
        let root = TempDir::new().unwrap();
        let env = Environment::new(&config(root.path())).unwrap();

        let path = env.resolve(&DatasetLocator::object("eis-dh-hydro", "LIS/ROUTING"));
        assert_eq!(path, root.path().join("data/eis-dh-hydro/LIS/ROUTING.zarr"));
    }
}
