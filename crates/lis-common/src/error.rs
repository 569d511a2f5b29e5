//! Error types for the LIS exploration toolkit.

use thiserror::Error;

/// Result type alias using LisError.
pub type Result<T> = std::result::Result<T, LisError>;

/// Errors raised by georeferencing, lookup, extraction, alignment and the
/// gage catalog.
///
/// Georeferencing and lookup failures are never recovered inside the core;
/// they propagate so the caller (usually the UI boundary) decides whether to
/// show a placeholder or an error message.
#[derive(Debug, Error)]
pub enum LisError {
    // === Georeferencing ===
    #[error("Missing grid metadata: {0}")]
    MissingMetadata(String),

    #[error("Invalid grid metadata for '{key}': {message}")]
    InvalidMetadata { key: String, message: String },

    #[error("Grid index ({ix}, {iy}) is outside the grid ({nx} x {ny})")]
    IndexOutOfRange { ix: i64, iy: i64, nx: usize, ny: usize },

    // === Lookup ===
    #[error("Invalid query point: {0}")]
    InvalidPoint(String),

    #[error("No candidate point has valid coordinates")]
    NoValidCandidates,

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Selection of '{variable}' at {location} contains no data")]
    EmptySelection { variable: String, location: String },

    // === Alignment ===
    #[error("No real alignment has been computed yet; null placeholder unavailable")]
    NoReferenceAvailable,

    // === Gage catalog ===
    #[error("Unknown gage: {0}")]
    UnknownGage(String),

    #[error("Gage already present in catalog: {0}")]
    DuplicateGage(String),

    #[error("Gage index {index} is out of range (catalog holds {len} gages)")]
    GageIndexOutOfRange { index: usize, len: usize },

    // === Input / infrastructure ===
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LisError {
    pub fn missing_metadata(key: impl Into<String>) -> Self {
        Self::MissingMetadata(key.into())
    }

    pub fn invalid_metadata(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn empty_selection(variable: impl Into<String>, location: impl ToString) -> Self {
        Self::EmptySelection {
            variable: variable.into(),
            location: location.to_string(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    /// Whether the error stems from the caller's selection rather than from
    /// broken data or infrastructure. The UI boundary logs these at a lower
    /// level.
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            LisError::IndexOutOfRange { .. }
                | LisError::EmptySelection { .. }
                | LisError::UnknownGage(_)
                | LisError::GageIndexOutOfRange { .. }
                | LisError::NoReferenceAvailable
        )
    }
}

impl From<std::io::Error> for LisError {
    fn from(err: std::io::Error) -> Self {
        LisError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for LisError {
    fn from(err: serde_json::Error) -> Self {
        LisError::ParseError(format!("JSON error: {}", err))
    }
}
