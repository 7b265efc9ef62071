//! CentroidSet - current cluster centers

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::point::Point;

/// Ordered collection of K cluster centers
///
/// The coordinator owns the canonical copy and overwrites it every round;
/// every other rank gets a fresh copy through the round's broadcast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CentroidSet {
    centroids: Vec<Point>,
}

impl CentroidSet {
    pub fn new(centroids: Vec<Point>) -> Self {
        Self { centroids }
    }

    /// Cluster count K
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Point> {
        self.centroids.get(index)
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.centroids
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.centroids.iter()
    }

    /// Reset every centroid to the origin
    pub fn clear(&mut self) {
        debug!(k = self.centroids.len(), "CentroidSet::clear: called");
        self.centroids.iter_mut().for_each(|c| *c = Point::ORIGIN);
    }

    /// Fold `point` into centroid `index` with the midpoint rule
    ///
    /// A centroid sitting exactly at the origin takes the point's coordinates;
    /// any other centroid moves to the midpoint between itself and the point.
    pub fn fold_midpoint(&mut self, index: usize, point: &Point) {
        if let Some(centroid) = self.centroids.get_mut(index) {
            *centroid = if centroid.is_origin() {
                *point
            } else {
                centroid.midpoint(point)
            };
        }
    }

    /// Overwrite centroid `index`
    pub fn set(&mut self, index: usize, point: Point) {
        if let Some(centroid) = self.centroids.get_mut(index) {
            *centroid = point;
        }
    }
}

impl From<Vec<Point>> for CentroidSet {
    fn from(centroids: Vec<Point>) -> Self {
        Self::new(centroids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(points: &[(f64, f64)]) -> CentroidSet {
        points.iter().copied().map(Point::from).collect::<Vec<_>>().into()
    }

    #[test]
    fn test_clear_resets_every_centroid() {
        let mut centroids = set(&[(1.0, 2.0), (-3.0, 4.5), (0.0, 7.0)]);
        centroids.clear();
        assert_eq!(centroids.len(), 3);
        assert!(centroids.iter().all(Point::is_origin));
    }

    #[test]
    fn test_fold_into_origin_takes_point() {
        let mut centroids = set(&[(0.0, 0.0)]);
        centroids.fold_midpoint(0, &Point::new(6.0, 8.0));
        assert_eq!(centroids.get(0), Some(&Point::new(6.0, 8.0)));
    }

    #[test]
    fn test_fold_into_occupied_takes_midpoint() {
        let mut centroids = set(&[(6.0, 8.0)]);
        centroids.fold_midpoint(0, &Point::new(2.0, 0.0));
        assert_eq!(centroids.get(0), Some(&Point::new(4.0, 4.0)));
    }

    #[test]
    fn test_fold_out_of_range_is_ignored() {
        let mut centroids = set(&[(1.0, 1.0)]);
        centroids.fold_midpoint(3, &Point::new(9.0, 9.0));
        assert_eq!(centroids, set(&[(1.0, 1.0)]));
    }

    #[test]
    fn test_serializes_as_plain_sequence() {
        let centroids = set(&[(1.5, -2.0)]);
        let json = serde_json::to_string(&centroids).unwrap();
        assert_eq!(json, r#"[{"x":1.5,"y":-2.0}]"#);
    }
}
