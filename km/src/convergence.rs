//! ConvergenceTracker - coordinator-side comparison of consecutive rounds

use tracing::debug;

use crate::domain::AssignmentVector;

/// Outcome of observing a freshly gathered assignment vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Identical to the previous round
    Converged,
    /// Differs from the previous round (or there was no previous round)
    Changed,
}

/// Holds the previous round's full assignment vector
#[derive(Debug, Clone, Default)]
pub struct ConvergenceTracker {
    previous: Option<AssignmentVector>,
}

impl ConvergenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `gathered` with the previous vector, keeping it when it differs
    ///
    /// Equality is exact and bitwise per element; vectors of different
    /// lengths are never equal.
    pub fn observe(&mut self, gathered: AssignmentVector) -> Verdict {
        let unchanged = self
            .previous
            .as_ref()
            .is_some_and(|previous| bitwise_eq(previous, &gathered));

        if unchanged {
            debug!(len = gathered.len(), "ConvergenceTracker::observe: converged");
            return Verdict::Converged;
        }

        debug!(len = gathered.len(), "ConvergenceTracker::observe: changed");
        self.previous = Some(gathered);
        Verdict::Changed
    }

    /// Most recent distinct assignment vector
    pub fn previous(&self) -> Option<&AssignmentVector> {
        self.previous.as_ref()
    }

    pub fn into_previous(self) -> Option<AssignmentVector> {
        self.previous
    }
}

fn bitwise_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}
