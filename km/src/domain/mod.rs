//! Domain types for distributed k-means
//!
//! Core value types shared by every rank: Point, the read-only Dataset
//! (PointStore) and the CentroidSet that is re-broadcast each round.

mod centroids;
mod dataset;
mod point;

pub use centroids::CentroidSet;
pub use dataset::Dataset;
pub use point::Point;

/// One float-encoded cluster id per point of the distributed portion
pub type AssignmentVector = Vec<f64>;
