//! Role - coordinator vs worker, fixed at startup

use tracing::{debug, info};

use crate::convergence::{ConvergenceTracker, Verdict};
use crate::domain::{AssignmentVector, CentroidSet, Dataset};
use crate::update::UpdateRule;

use super::round::Signal;

/// State only the coordinator carries
#[derive(Debug, Clone)]
pub struct CoordinatorState {
    dataset: Dataset,
    centroids: CentroidSet,
    tracker: ConvergenceTracker,
    rule: UpdateRule,
}

impl CoordinatorState {
    pub fn new(dataset: Dataset, centroids: CentroidSet, rule: UpdateRule) -> Self {
        debug!(points = dataset.len(), k = centroids.len(), %rule, "CoordinatorState::new: called");
        Self {
            dataset,
            centroids,
            tracker: ConvergenceTracker::new(),
            rule,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Canonical centroid set
    pub fn centroids(&self) -> &CentroidSet {
        &self.centroids
    }

    pub fn tracker(&self) -> &ConvergenceTracker {
        &self.tracker
    }

    /// Convergence check followed by the centroid update when the round changed
    pub fn check_and_update(&mut self, gathered: AssignmentVector) -> Signal {
        match self.tracker.observe(gathered) {
            Verdict::Converged => {
                info!("Assignments unchanged, stopping");
                Signal::Stop
            }
            Verdict::Changed => {
                if let Some(assignments) = self.tracker.previous() {
                    self.rule
                        .apply(&mut self.centroids, self.dataset.points(), assignments);
                }
                Signal::Continue
            }
        }
    }

    /// Final centroids and the last distinct assignment vector
    pub fn into_parts(self) -> (Dataset, CentroidSet, AssignmentVector) {
        let assignments = self.tracker.into_previous().unwrap_or_default();
        (self.dataset, self.centroids, assignments)
    }
}

/// What a rank does beyond the shared round
#[derive(Debug, Clone)]
pub enum Role {
    Coordinator(Box<CoordinatorState>),
    Worker,
}

impl Role {
    pub fn is_coordinator(&self) -> bool {
        matches!(self, Role::Coordinator(_))
    }

    /// Centroids to broadcast; only the coordinator has them
    pub fn centroids(&self) -> Option<&CentroidSet> {
        match self {
            Role::Coordinator(state) => Some(state.centroids()),
            Role::Worker => None,
        }
    }
}
