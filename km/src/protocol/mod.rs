//! CoordinationProtocol - the distributed convergence loop
//!
//! Every rank runs the same round in lock-step:
//!
//! 1. broadcast the centroid set from the coordinator
//! 2. assign the local chunk
//! 3. gather assignments at the coordinator, in rank order
//! 4. coordinator only: convergence check, centroid update when changed
//! 5. decrement the local iteration counter
//! 6. barrier
//! 7. broadcast the continue/stop signal
//!
//! The loop ends when the counter reaches zero or the signal says stop.

mod error;
mod role;
mod round;
mod run;

pub use error::RunError;
pub use role::{CoordinatorState, Role};
pub use round::{RoundState, Signal};
pub use run::{ClusterResult, KMeansRun, RankOutcome, RunOptions, run_rank};
