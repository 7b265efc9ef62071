//! Initial centroid selection

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::domain::{CentroidSet, Dataset};

/// Errors raised while choosing initial centroids
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitError {
    #[error("Cluster count must be at least 1")]
    NoClusters,

    #[error("Cannot pick {k} distinct centroids from {n} points")]
    TooManyClusters { k: usize, n: usize },
}

/// Pick `k` distinct dataset points uniformly at random as starting centroids
///
/// Points are drawn by index, so duplicate coordinates in the dataset can still
/// yield coincident centroids.
pub fn initial_centroids<R: Rng + ?Sized>(dataset: &Dataset, k: usize, rng: &mut R) -> Result<CentroidSet, InitError> {
    debug!(k, points = dataset.len(), "initial_centroids: called");
    if k == 0 {
        return Err(InitError::NoClusters);
    }
    if k > dataset.len() {
        return Err(InitError::TooManyClusters { k, n: dataset.len() });
    }

    let centroids = rand::seq::index::sample(rng, dataset.len(), k)
        .into_iter()
        .filter_map(|index| dataset.get(index).copied())
        .collect::<Vec<_>>();

    Ok(CentroidSet::new(centroids))
}

/// Seeded generator when `seed` is given, OS entropy otherwise
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            debug!(seed, "seeded_rng: using fixed seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    }
}
