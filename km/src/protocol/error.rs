//! Run error types

use collective::CollectiveError;
use thiserror::Error;

/// Errors that abort a distributed run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Centroid set is empty")]
    NoCentroids,

    #[error("Collective operation failed: {0}")]
    Collective(#[from] CollectiveError),

    #[error("Rank task failed: {0}")]
    RankFailed(String),

    #[error("Coordinator rank did not report a result")]
    MissingCoordinator,
}
