//! Dataset loader
//!
//! Reads whitespace-separated rows. Column 0 is an ignored label, columns 1 and
//! 2 are integer coordinates. A row that starts with whitespace has an empty
//! label, so its coordinates shift one column to the right.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Dataset, Point};

/// Errors raised while reading a dataset
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed row at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("No points found in {path}")]
    Empty { path: PathBuf },
}

/// Options for [`load_dataset`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Log and skip malformed rows instead of failing
    pub skip_malformed: bool,
}

/// Load a dataset from `path`
pub fn load_dataset(path: impl AsRef<Path>, options: LoadOptions) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    debug!(path = %path.display(), ?options, "load_dataset: called");

    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = parse_dataset(&content, options)?;
    if dataset.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    info!(points = dataset.len(), path = %path.display(), "Loaded dataset");
    Ok(dataset)
}

/// Parse dataset rows from text; line numbers in errors are 1-based
pub fn parse_dataset(content: &str, options: LoadOptions) -> Result<Dataset, LoadError> {
    let mut points = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        match parse_row(line) {
            Ok(point) => points.push(point),
            Err(reason) if options.skip_malformed => {
                warn!(line = line_no, %reason, "Skipping malformed row");
            }
            Err(reason) => {
                return Err(LoadError::Malformed { line: line_no, reason });
            }
        }
    }

    debug!(points = points.len(), "parse_dataset: parsed rows");
    Ok(Dataset::new(points))
}

fn parse_row(line: &str) -> Result<Point, String> {
    let mut columns: Vec<&str> = line.split_whitespace().collect();
    if line.starts_with(char::is_whitespace) {
        columns.insert(0, "");
    }

    if columns.len() < 3 {
        return Err(format!("expected at least 3 columns, found {}", columns.len()));
    }

    let x = parse_coordinate(columns[1])?;
    let y = parse_coordinate(columns[2])?;
    Ok(Point::new(x, y))
}

fn parse_coordinate(column: &str) -> Result<f64, String> {
    column
        .parse::<i64>()
        .map(|value| value as f64)
        .map_err(|e| format!("invalid coordinate '{}': {}", column, e))
}
