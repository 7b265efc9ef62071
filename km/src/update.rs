//! CentroidUpdater - recompute centers from the latest assignment
//!
//! Two rules are available:
//!
//! - **midpoint** (default): reset every centroid to the origin, then fold the
//!   points in dataset order. A centroid at the origin takes the point as is;
//!   otherwise it moves to the midpoint of itself and the point. The result
//!   depends on point order and is not the arithmetic mean.
//! - **mean**: running sum and count per cluster, divided once all points are
//!   folded. Clusters without points keep their previous center.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CentroidSet, Point};

/// Which update rule the coordinator applies after a changed round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateRule {
    #[default]
    Midpoint,
    Mean,
}

impl UpdateRule {
    /// Overwrite `centroids` from `points` and their `assignments`
    ///
    /// Only the first `assignments.len()` points take part; points past the
    /// distributed portion are never folded in.
    pub fn apply(self, centroids: &mut CentroidSet, points: &[Point], assignments: &[f64]) {
        debug!(rule = %self, k = centroids.len(), points = assignments.len(), "UpdateRule::apply: called");
        match self {
            UpdateRule::Midpoint => update_midpoint(centroids, points, assignments),
            UpdateRule::Mean => update_mean(centroids, points, assignments),
        }
    }
}

impl fmt::Display for UpdateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateRule::Midpoint => write!(f, "midpoint"),
            UpdateRule::Mean => write!(f, "mean"),
        }
    }
}

impl FromStr for UpdateRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "midpoint" => Ok(Self::Midpoint),
            "mean" => Ok(Self::Mean),
            _ => Err(format!("Unknown update rule: {}. Use: midpoint or mean", s)),
        }
    }
}

fn update_midpoint(centroids: &mut CentroidSet, points: &[Point], assignments: &[f64]) {
    centroids.clear();
    for (point, &cluster) in points.iter().zip(assignments) {
        centroids.fold_midpoint(cluster as usize, point);
    }
}

fn update_mean(centroids: &mut CentroidSet, points: &[Point], assignments: &[f64]) {
    let mut sums = vec![(0.0f64, 0.0f64, 0usize); centroids.len()];
    for (point, &cluster) in points.iter().zip(assignments) {
        if let Some((sx, sy, count)) = sums.get_mut(cluster as usize) {
            *sx += point.x;
            *sy += point.y;
            *count += 1;
        }
    }

    for (index, (sx, sy, count)) in sums.into_iter().enumerate() {
        if count > 0 {
            let n = count as f64;
            centroids.set(index, Point::new(sx / n, sy / n));
        }
    }
}

/// Clusters that received no point in `assignments`
pub fn degenerate_clusters(k: usize, assignments: &[f64]) -> Vec<usize> {
    let mut used = vec![false; k];
    for &cluster in assignments {
        if let Some(slot) = used.get_mut(cluster as usize) {
            *slot = true;
        }
    }

    used.iter()
        .enumerate()
        .filter_map(|(index, &hit)| (!hit).then_some(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn test_midpoint_square_round() {
        let data = points(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
        let mut centroids = CentroidSet::new(points(&[(0.0, 0.0), (10.0, 10.0)]));

        UpdateRule::Midpoint.apply(&mut centroids, &data, &[0.0, 0.0, 0.0, 1.0]);

        // (0,0) leaves centroid 0 at the origin, so (10,0) is taken as is
        assert_eq!(centroids.as_slice(), points(&[(5.0, 5.0), (10.0, 10.0)]).as_slice());
    }

    #[test]
    fn test_midpoint_is_order_dependent() {
        let forward = points(&[(2.0, 0.0), (4.0, 0.0), (8.0, 0.0)]);
        let backward: Vec<Point> = forward.iter().rev().copied().collect();
        let labels = [0.0, 0.0, 0.0];

        let mut a = CentroidSet::new(points(&[(1.0, 1.0)]));
        let mut b = a.clone();
        UpdateRule::Midpoint.apply(&mut a, &forward, &labels);
        UpdateRule::Midpoint.apply(&mut b, &backward, &labels);

        assert_eq!(a.get(0), Some(&Point::new(5.5, 0.0)));
        assert_eq!(b.get(0), Some(&Point::new(4.0, 0.0)));
        assert_ne!(a, b);
    }

    #[test]
    fn test_midpoint_resets_before_folding() {
        let mut centroids = CentroidSet::new(points(&[(3.0, 4.0), (7.0, 7.0), (-1.0, 2.0)]));

        UpdateRule::Midpoint.apply(&mut centroids, &[], &[]);

        assert!(centroids.iter().all(Point::is_origin));
    }

    #[test]
    fn test_midpoint_unassigned_cluster_stays_at_origin() {
        let data = points(&[(4.0, 4.0), (6.0, 6.0)]);
        let mut centroids = CentroidSet::new(points(&[(5.0, 5.0), (100.0, 100.0)]));

        UpdateRule::Midpoint.apply(&mut centroids, &data, &[0.0, 0.0]);

        assert_eq!(centroids.get(0), Some(&Point::new(5.0, 5.0)));
        assert_eq!(centroids.get(1), Some(&Point::ORIGIN));
    }

    #[test]
    fn test_midpoint_ignores_points_past_assignments() {
        let data = points(&[(2.0, 2.0), (4.0, 4.0), (50.0, 50.0)]);
        let mut centroids = CentroidSet::new(points(&[(1.0, 1.0)]));

        UpdateRule::Midpoint.apply(&mut centroids, &data, &[0.0, 0.0]);

        assert_eq!(centroids.get(0), Some(&Point::new(3.0, 3.0)));
    }

    #[test]
    fn test_mean_is_order_independent() {
        let forward = points(&[(2.0, 0.0), (4.0, 0.0), (8.0, 0.0)]);
        let backward: Vec<Point> = forward.iter().rev().copied().collect();
        let labels = [0.0, 0.0, 0.0];

        let mut a = CentroidSet::new(points(&[(1.0, 1.0)]));
        let mut b = a.clone();
        UpdateRule::Mean.apply(&mut a, &forward, &labels);
        UpdateRule::Mean.apply(&mut b, &backward, &labels);

        assert_eq!(a.get(0), Some(&Point::new(14.0 / 3.0, 0.0)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_mean_keeps_empty_cluster() {
        let data = points(&[(4.0, 4.0), (6.0, 6.0)]);
        let mut centroids = CentroidSet::new(points(&[(5.0, 5.0), (100.0, 100.0)]));

        UpdateRule::Mean.apply(&mut centroids, &data, &[0.0, 0.0]);

        assert_eq!(centroids.get(1), Some(&Point::new(100.0, 100.0)));
    }

    #[test]
    fn test_degenerate_clusters() {
        assert_eq!(degenerate_clusters(4, &[0.0, 2.0, 2.0]), vec![1, 3]);
        assert!(degenerate_clusters(2, &[1.0, 0.0]).is_empty());
        assert_eq!(degenerate_clusters(2, &[]), vec![0, 1]);
    }

    #[test]
    fn test_update_rule_from_str() {
        assert_eq!("midpoint".parse::<UpdateRule>().unwrap(), UpdateRule::Midpoint);
        assert_eq!("MEAN".parse::<UpdateRule>().unwrap(), UpdateRule::Mean);
        assert!("median".parse::<UpdateRule>().is_err());
    }

    #[test]
    fn test_update_rule_serde() {
        let yaml = serde_yaml::to_string(&UpdateRule::Mean).unwrap();
        assert_eq!(yaml.trim(), "mean");
        let rule: UpdateRule = serde_yaml::from_str("midpoint").unwrap();
        assert_eq!(rule, UpdateRule::Midpoint);
    }
}
