//! Gage file ingestion.
//!
//! Two whitespace-delimited formats:
//!
//! - **Header file**: one row per gage. Column positions of the id,
//!   longitude and latitude come from [`GageFileConfig`]. A leading row whose
//!   coordinates are not numeric is taken as column titles and skipped.
//! - **Data file**: one `date value` row per observation (or
//!   `date time value`). The gage id is the file stem, so `08158000.txt`
//!   holds observations for gage `08158000`.
//!
//! Blank lines and lines starting with `#` are ignored in both.

use std::path::{Path, PathBuf};

use lis_common::{parse_timestamp, LisError, Provenance, Result, TimeSeries};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::GageFileConfig;

/// One parsed header row.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRow {
    pub id: String,
    pub lon: f64,
    pub lat: f64,
    /// Values of `data_cols`, in configured order.
    pub attributes: Vec<String>,
}

fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parse header file contents.
pub fn parse_gage_header(text: &str, config: &GageFileConfig) -> Result<Vec<HeaderRow>> {
    config.validate().map_err(LisError::ConfigError)?;

    let mut rows = Vec::new();
    for (n, (line_no, line)) in content_lines(text).enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= config.max_col() {
            return Err(LisError::parse(format!(
                "header line {}: expected at least {} columns, found {}",
                line_no,
                config.max_col() + 1,
                fields.len()
            )));
        }

        let lon = fields[config.lon_col].parse::<f64>();
        let lat = fields[config.lat_col].parse::<f64>();
        let (lon, lat) = match (lon, lat) {
            (Ok(lon), Ok(lat)) => (lon, lat),
            _ if n == 0 => {
                debug!(line = line_no, "Skipping header title row");
                continue;
            }
            _ => {
                return Err(LisError::parse(format!(
                    "header line {}: invalid coordinates '{}' '{}'",
                    line_no, fields[config.lon_col], fields[config.lat_col]
                )))
            }
        };

        rows.push(HeaderRow {
            id: fields[config.id_col].to_string(),
            lon,
            lat,
            attributes: config
                .data_cols
                .iter()
                .map(|&c| fields[c].to_string())
                .collect(),
        });
    }
    Ok(rows)
}

/// Read a gage header file.
pub fn read_gage_header(path: &Path, config: &GageFileConfig) -> Result<Vec<HeaderRow>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| LisError::storage(format!("{}: {}", path.display(), e)))?;
    parse_gage_header(&text, config).map_err(|e| in_file(path, e))
}

/// Parse data file contents for gage `id`.
///
/// Rows may come in any order. On duplicate timestamps the later row wins.
pub fn parse_gage_series(id: &str, text: &str, config: &GageFileConfig) -> Result<TimeSeries> {
    let mut points = Vec::new();
    for (line_no, line) in content_lines(text) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (stamp, value) = match fields.as_slice() {
            [date, value] => (parse_timestamp(date)?, *value),
            [date, time, value] => (parse_timestamp(&format!("{} {}", date, time))?, *value),
            _ => {
                return Err(LisError::parse(format!(
                    "line {}: expected 'date value', found {} fields",
                    line_no,
                    fields.len()
                )))
            }
        };

        let mut value: f64 = value
            .parse()
            .map_err(|_| LisError::parse(format!("line {}: invalid value '{}'", line_no, value)))?;
        if config.missing_value == Some(value) {
            value = f64::NAN;
        }
        points.push((stamp, value));
    }

    let (series, duplicates) = TimeSeries::from_unsorted(Provenance::gage(id), points);
    if duplicates > 0 {
        warn!(gage = id, duplicates, "Dropped duplicate timestamps");
    }
    Ok(series)
}

/// Gage id encoded in a data file name.
pub fn gage_id_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LisError::parse(format!("cannot derive gage id from {}", path.display())))
}

/// Read one gage data file, returning the gage id and its series.
pub fn read_gage_series(path: &Path, config: &GageFileConfig) -> Result<(String, TimeSeries)> {
    let id = gage_id_from_path(path)?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| LisError::storage(format!("{}: {}", path.display(), e)))?;
    let series = parse_gage_series(&id, &text, config).map_err(|e| in_file(path, e))?;
    debug!(gage = %id, points = series.len(), "Read gage data file");
    Ok((id, series))
}

/// Prefix parse errors with the file they came from.
fn in_file(path: &Path, err: LisError) -> LisError {
    match err {
        LisError::ParseError(msg) => LisError::ParseError(format!("{}: {}", path.display(), msg)),
        other => other,
    }
}

/// Data files under `dir` with the given extension, sorted by path.
pub fn scan_gage_dir(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| LisError::storage(format!("{}: {}", dir.display(), e)))?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(extension)
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
