//! Common test fixtures for LIS explorer tests.
//!
//! Gage header and data files in the layout the ingestion layer reads:
//! a whitespace-delimited header with the gage id in column 0 and
//! longitude/latitude in columns 3/4, plus one `<id>.txt` file per gage
//! holding `date value` rows.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Named points on the 4 x 4 scenario grid (`DX = DY = 0.25`, corner
/// (-100.0, 30.0)).
pub mod points {
    /// Falls in cell (0, 1).
    pub const SCENARIO_GAGE: (f64, f64) = (-99.8, 30.3);

    /// Falls in cell (2, 3).
    pub const NORTH_EAST_GAGE: (f64, f64) = (-99.4, 30.8);

    /// West of the grid.
    pub const OUTSIDE: (f64, f64) = (-101.0, 30.5);
}

/// A gage row for a header file.
#[derive(Debug, Clone)]
pub struct GageEntry {
    pub id: String,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    /// Data file body; `None` writes no data file for this gage.
    pub rows: Option<String>,
}

impl GageEntry {
    pub fn new(id: &str, lon: f64, lat: f64) -> Self {
        Self {
            id: id.to_string(),
            name: format!("Gage_{}", id),
            lon,
            lat,
            rows: None,
        }
    }

    pub fn with_rows(mut self, rows: impl Into<String>) -> Self {
        self.rows = Some(rows.into());
        self
    }
}

/// Header line in the default column layout.
pub const HEADER_LINE: &str = "site_no station_nm drain_area lon lat";

/// Header file body in the default column layout:
/// `id name area lon lat`.
pub fn header_text(gages: &[GageEntry]) -> String {
    let mut text = format!("{}\n", HEADER_LINE);
    for g in gages {
        text.push_str(&format!("{} {} 100.0 {} {}\n", g.id, g.name, g.lon, g.lat));
    }
    text
}

/// Write a header file and one data file per gage with rows.
pub struct GageFixture {
    pub dir: TempDir,
    pub header: PathBuf,
    pub data_files: Vec<PathBuf>,
}

impl GageFixture {
    pub fn write(gages: &[GageEntry]) -> io::Result<Self> {
        let dir = TempDir::new()?;
        let header = dir.path().join("gages.hdr");
        fs::write(&header, header_text(gages))?;

        let data_dir = dir.path().join("data");
        fs::create_dir_all(&data_dir)?;

        let mut data_files = Vec::new();
        for g in gages {
            if let Some(rows) = &g.rows {
                let path = data_dir.join(format!("{}.txt", g.id));
                fs::write(&path, rows)?;
                data_files.push(path);
            }
        }

        Ok(Self {
            dir,
            header,
            data_files,
        })
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    /// Write an extra file next to the data files.
    pub fn add_file(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.data_dir().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}
