//! Result dump
//!
//! Tab-separated layout: one `x\ty` row per centroid, a `dataset` marker row,
//! then one row per dataset point.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{CentroidSet, Dataset, Point};

/// Marker row separating centroids from dataset points
pub const DATASET_MARKER: &str = "dataset";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write the final centroids followed by the dataset to `path`
pub fn write_dump(path: impl AsRef<Path>, centroids: &CentroidSet, dataset: &Dataset) -> Result<(), ExportError> {
    let path = path.as_ref();
    debug!(path = %path.display(), k = centroids.len(), points = dataset.len(), "write_dump: called");

    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    write_rows(&mut writer, centroids, dataset).map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    info!(path = %path.display(), "Wrote result dump");
    Ok(())
}

/// Write the dump layout to any writer
pub fn write_rows<W: Write>(writer: &mut W, centroids: &CentroidSet, dataset: &Dataset) -> std::io::Result<()> {
    for centroid in centroids.iter() {
        write_point(writer, centroid)?;
    }
    writeln!(writer, "{}", DATASET_MARKER)?;
    for point in dataset {
        write_point(writer, point)?;
    }
    Ok(())
}

fn write_point<W: Write>(writer: &mut W, point: &Point) -> std::io::Result<()> {
    writeln!(writer, "{}\t{}", point.x, point.y)
}
