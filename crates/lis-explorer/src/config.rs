//! Configuration for the explorer.
//!
//! Every tunable is a named field with a default; configs load from YAML or
//! from `LIS_*` environment variables and are checked with `validate()`
//! before use.

use std::path::{Path, PathBuf};

use lis_common::{LisError, Result};
use serde::{Deserialize, Serialize};

/// Column layout of gage header and data files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GageFileConfig {
    /// Header column holding the gage id.
    pub id_col: usize,

    /// Header column holding longitude.
    pub lon_col: usize,

    /// Header column holding latitude.
    pub lat_col: usize,

    /// Extra header columns kept as string attributes.
    pub data_cols: Vec<usize>,

    /// Sentinel in data files meaning "no observation".
    pub missing_value: Option<f64>,

    /// Extension of data files when scanning a directory.
    pub file_extension: String,
}

impl Default for GageFileConfig {
    fn default() -> Self {
        Self {
            id_col: 0,
            lon_col: 3,
            lat_col: 4,
            data_cols: Vec::new(),
            missing_value: None,
            file_extension: "txt".to_string(),
        }
    }
}

impl GageFileConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut cols = vec![self.id_col, self.lon_col, self.lat_col];
        cols.extend(&self.data_cols);
        let mut sorted = cols.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != cols.len() {
            return Err(format!("gage file columns must be distinct, got {:?}", cols));
        }

        if let Some(v) = self.missing_value {
            if !v.is_finite() {
                return Err("missing_value must be finite".to_string());
            }
        }

        if self.file_extension.is_empty() {
            return Err("file_extension must not be empty".to_string());
        }

        Ok(())
    }

    /// Highest column index a header row must have.
    pub fn max_col(&self) -> usize {
        self.data_cols
            .iter()
            .copied()
            .chain([self.id_col, self.lon_col, self.lat_col])
            .max()
            .unwrap_or(0)
    }
}

/// Styling of the gage map layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapStyle {
    pub color: String,
    pub size: u32,
    pub width: u32,
    pub height: u32,
    pub tools: Vec<String>,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            color: "red".to_string(),
            size: 10,
            width: 600,
            height: 400,
            tools: vec!["tap".to_string(), "hover".to_string()],
        }
    }
}

/// Size of the series plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphStyle {
    pub width: u32,
    pub height: u32,
}

impl Default for GraphStyle {
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Text
    }
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level explorer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Variable selected first when the dataset offers it.
    pub default_variable: String,

    /// Gage file layout.
    pub gage_files: GageFileConfig,

    pub map_style: MapStyle,

    pub graph_style: GraphStyle,

    /// Extracted series kept per session.
    pub series_cache_entries: usize,

    /// Directory for cached artifacts.
    pub cache_dir: PathBuf,

    /// Root of local datasets; object locators resolve below it.
    pub data_dir: PathBuf,

    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            default_variable: "Streamflow_tavg".to_string(),
            gage_files: GageFileConfig::default(),
            map_style: MapStyle::default(),
            graph_style: GraphStyle::default(),
            series_cache_entries: 256,
            cache_dir: PathBuf::from(".lis-cache"),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ExplorerConfig {
    /// Parse a YAML document. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| LisError::ConfigError(format!("invalid YAML: {}", e)))
    }

    /// Load a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LisError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `LIS_*` environment variables that are set and
    /// parse. Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("LIS_DEFAULT_VARIABLE") {
            self.default_variable = val;
        }

        if let Ok(val) = std::env::var("LIS_SERIES_CACHE_ENTRIES") {
            if let Ok(entries) = val.parse() {
                self.series_cache_entries = entries;
            }
        }

        if let Ok(val) = std::env::var("LIS_CACHE_DIR") {
            self.cache_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("LIS_DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("LIS_GAGE_ID_COL") {
            if let Ok(col) = val.parse() {
                self.gage_files.id_col = col;
            }
        }

        if let Ok(val) = std::env::var("LIS_GAGE_LON_COL") {
            if let Ok(col) = val.parse() {
                self.gage_files.lon_col = col;
            }
        }

        if let Ok(val) = std::env::var("LIS_GAGE_LAT_COL") {
            if let Ok(col) = val.parse() {
                self.gage_files.lat_col = col;
            }
        }

        if let Ok(val) = std::env::var("LIS_LOG_LEVEL") {
            self.log_level = val;
        }

        if let Ok(val) = std::env::var("LIS_LOG_FORMAT") {
            self.log_format = LogFormat::from_str(&val);
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.default_variable.is_empty() {
            return Err("default_variable must not be empty".to_string());
        }

        if self.series_cache_entries == 0 {
            return Err("series_cache_entries must be > 0".to_string());
        }

        if self.map_style.width == 0 || self.map_style.height == 0 {
            return Err("map_style width and height must be > 0".to_string());
        }

        if self.graph_style.width == 0 || self.graph_style.height == 0 {
            return Err("graph_style width and height must be > 0".to_string());
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(format!("unknown log_level: {}", other)),
        }

        self.gage_files.validate()
    }

    /// Validate, mapping failures to [`LisError::ConfigError`].
    pub fn validated(self) -> Result<Self> {
        self.validate().map_err(LisError::ConfigError)?;
        Ok(self)
    }
}
