//! AssignmentEngine - nearest-centroid labelling of a local chunk

use tracing::debug;

use crate::domain::{AssignmentVector, CentroidSet, Point};

/// Index of the centroid nearest to `point`
///
/// Ties resolve to the lowest index. Returns 0 for an empty centroid slice.
pub fn nearest(point: &Point, centroids: &[Point]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;

    for (index, centroid) in centroids.iter().enumerate() {
        let distance = point.distance(centroid);
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }

    best
}

/// Per-rank assignment unit owning its chunk of the dataset
#[derive(Debug, Clone, Default)]
pub struct AssignmentEngine {
    chunk: Vec<Point>,
}

impl AssignmentEngine {
    pub fn new(chunk: Vec<Point>) -> Self {
        Self { chunk }
    }

    /// Number of points this rank is responsible for
    pub fn len(&self) -> usize {
        self.chunk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk.is_empty()
    }

    pub fn chunk(&self) -> &[Point] {
        &self.chunk
    }

    /// Label every local point with its nearest centroid
    pub fn assign(&self, centroids: &CentroidSet) -> AssignmentVector {
        debug!(points = self.chunk.len(), k = centroids.len(), "AssignmentEngine::assign: called");
        self.chunk
            .iter()
            .map(|point| nearest(point, centroids.as_slice()) as f64)
            .collect()
    }
}
