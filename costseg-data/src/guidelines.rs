//! CSV loader for the commercial guideline table.
//!
//! ## CSV Format
//!
//! One row per property type. Headers are matched case-insensitively and
//! column order does not matter.
//!
//! | Column                                      | Required | Notes                          |
//! |---------------------------------------------|----------|--------------------------------|
//! | `Property Type` / `Property Type Guideline` | yes      | matched against the request    |
//! | `39-yr` / `39 yr` / `39`                    | no       | fraction or percent, e.g. `72%`|
//! | `15-yr` / `15 yr` / `15`                    | no       |                                |
//! | `7-yr` / `7 yr` / `7`                       | no       |                                |
//! | `5-yr` / `5 yr` / `5`                       | no       |                                |
//! | `Total Accelerated` / `Total Accelerated %` | no       | defaults to 5 + 7 + 15         |
//! | `Dep. Life`                                 | no       | echoed on the result           |
//!
//! ### Example
//!
//! ```csv
//! Property Type,39-yr,15-yr,7-yr,5-yr,Dep. Life
//! Medical Center,0.72,0.10,0.03,0.15,39
//! ```
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use costseg_core::{GuidelineTable, GuidelineTableError};
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Public error type
// ---------------------------------------------------------------------------

/// Errors raised while loading a guideline table.
#[derive(Debug, Error)]
pub enum GuidelineLoadError {
    #[error("failed to read guideline file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not readable CSV.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV parsed but cannot serve as a guideline table.
    #[error(transparent)]
    Table(#[from] GuidelineTableError),
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Reads guideline tables from CSV.
pub struct GuidelineLoader;

impl GuidelineLoader {
    /// Parse a guideline table from any reader.
    ///
    /// Cells are trimmed, ragged rows are accepted, and rows whose cells are
    /// all empty are dropped.
    ///
    /// # Errors
    ///
    /// * [`GuidelineLoadError::Csv`] when the input is not valid CSV.
    /// * [`GuidelineLoadError::Table`] when no property-type column exists.
    pub fn parse<R: Read>(reader: R) -> Result<GuidelineTable, GuidelineLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let table = GuidelineTable::new(headers, rows)?;
        debug!(rows = table.len(), "loaded guideline table");
        Ok(table)
    }

    /// Convenience wrapper: open `path` and delegate to [`GuidelineLoader::parse`].
    pub fn load_from_file(path: &Path) -> Result<GuidelineTable, GuidelineLoadError> {
        let file = File::open(path).map_err(|source| GuidelineLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(file)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
