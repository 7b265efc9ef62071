//! kmeans-spmd - distributed k-means over a fixed group of ranks
//!
//! A coordinator (rank 0) owns the dataset and the canonical centroids. The
//! dataset is scattered once; after that every round broadcasts the centroids,
//! assigns each local point to its nearest centroid, gathers the assignments
//! back at the coordinator and lets it decide whether to stop.
//!
//! # Modules
//!
//! - [`domain`] - points, datasets and centroid sets
//! - [`partition`] - equal contiguous chunks per rank
//! - [`assign`] - nearest-centroid assignment of a local chunk
//! - [`convergence`] - comparison of consecutive assignment vectors
//! - [`update`] - centroid update rules
//! - [`protocol`] - the lock-step round and the local run driver
//! - [`loader`], [`init`], [`export`] - dataset input, seeding and result dump
//! - [`config`], [`cli`] - configuration and command-line interface
//!
//! # Example
//!
//! ```ignore
//! use kmeans_spmd::{KMeansRun, LoadOptions, RunOptions, initial_centroids, load_dataset, seeded_rng};
//!
//! let dataset = load_dataset("points.tsv", LoadOptions::default())?;
//! let centroids = initial_centroids(&dataset, 8, &mut seeded_rng(Some(7)))?;
//! let result = KMeansRun::new(RunOptions { workers: 4, ..Default::default() })
//!     .execute(dataset, centroids)
//!     .await?;
//! println!("{} rounds", result.rounds);
//! ```

pub mod assign;
pub mod cli;
pub mod config;
pub mod convergence;
pub mod domain;
pub mod export;
pub mod init;
pub mod loader;
pub mod partition;
pub mod protocol;
pub mod update;

pub use config::Config;
pub use domain::{AssignmentVector, CentroidSet, Dataset, Point};
pub use export::{ExportError, write_dump};
pub use init::{InitError, initial_centroids, seeded_rng};
pub use loader::{LoadError, LoadOptions, load_dataset};
pub use partition::Partition;
pub use protocol::{ClusterResult, KMeansRun, RunError, RunOptions};
pub use update::UpdateRule;

/// Default number of clusters
pub const DEFAULT_CLUSTERS: usize = 100;

/// Default cap on the number of rounds
pub const DEFAULT_MAX_ITERATIONS: u32 = 400;
