//! Rank loop and the local run driver

use std::time::{Duration, Instant};

use collective::{Communicator, DEFAULT_CHANNEL_BUFFER, ROOT, bootstrap_local};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::DEFAULT_MAX_ITERATIONS;
use crate::assign::AssignmentEngine;
use crate::domain::{AssignmentVector, CentroidSet, Dataset, Point};
use crate::partition::Partition;
use crate::update::{UpdateRule, degenerate_clusters};

use super::error::RunError;
use super::role::{CoordinatorState, Role};
use super::round::{RoundState, Signal};

/// Parameters of a distributed run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Number of ranks, coordinator included
    pub workers: usize,

    /// Safety bound on the number of rounds
    pub max_iterations: u32,

    pub update_rule: UpdateRule,

    /// Per-rank inbox capacity
    pub channel_buffer: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            update_rule: UpdateRule::default(),
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

/// What a single rank reports once its loop ends
#[derive(Debug)]
pub struct RankOutcome {
    pub rank: usize,
    pub rounds: u32,
    pub converged: bool,
    /// Time spent in the round loop
    pub elapsed: Duration,
    /// Present on the coordinator only
    pub coordinator: Option<CoordinatorState>,
}

/// Run the convergence loop on one rank
///
/// `chunk` is the rank's share of the dataset, already scattered. Every rank of
/// the group must call this with the same `max_iterations`.
pub async fn run_rank(
    comm: &mut Communicator,
    mut role: Role,
    chunk: Vec<Point>,
    max_iterations: u32,
) -> Result<RankOutcome, RunError> {
    let rank = comm.rank();
    debug!(rank, points = chunk.len(), max_iterations, "run_rank: called");

    let engine = AssignmentEngine::new(chunk);
    let mut state = RoundState::new(max_iterations);
    let started = Instant::now();

    while state.should_continue() {
        let round = state.begin_round();
        debug!(rank, round, "run_rank: round start");

        let centroids: CentroidSet = comm.broadcast(ROOT, role.centroids().cloned()).await?;
        let local = engine.assign(&centroids);
        let gathered = comm.gather(ROOT, local).await?;

        let mut signal = Signal::Continue;
        if let (Role::Coordinator(coordinator), Some(gathered)) = (&mut role, gathered) {
            signal = coordinator.check_and_update(gathered);
        }

        state.tick();
        comm.barrier().await?;

        let signal = comm.broadcast(ROOT, role.is_coordinator().then_some(signal)).await?;
        state.observe(signal);
    }

    let elapsed = started.elapsed();
    debug!(rank, rounds = state.rounds, converged = state.converged, "run_rank: loop finished");

    let coordinator = match role {
        Role::Coordinator(state) => Some(*state),
        Role::Worker => None,
    };

    Ok(RankOutcome {
        rank,
        rounds: state.rounds,
        converged: state.converged,
        elapsed,
        coordinator,
    })
}

/// Final state of a finished run, as seen by the coordinator
#[derive(Debug, Clone)]
pub struct ClusterResult {
    pub centroids: CentroidSet,

    /// Last distinct gathered assignment vector
    pub assignments: AssignmentVector,

    pub rounds: u32,
    pub converged: bool,

    /// Wall-clock time of the round loop on the coordinator
    pub elapsed: Duration,

    /// Clusters that ended without any assigned point
    pub degenerate_clusters: Vec<usize>,

    pub distributed_points: usize,
    pub dropped_points: usize,

    /// The dataset, handed back for export
    pub dataset: Dataset,
}

impl ClusterResult {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Runs the protocol on a group of ranks living in this process
///
/// One tokio task per rank; rank 0 is the coordinator and owns the dataset
/// and the canonical centroid set.
#[derive(Debug, Clone, Default)]
pub struct KMeansRun {
    options: RunOptions,
}

impl KMeansRun {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Scatter `dataset`, iterate from `centroids` until convergence or the cap
    pub async fn execute(&self, dataset: Dataset, centroids: CentroidSet) -> Result<ClusterResult, RunError> {
        let workers = self.options.workers;
        let max_iterations = self.options.max_iterations;
        let rule = self.options.update_rule;

        if workers == 0 {
            return Err(RunError::NoWorkers);
        }
        if centroids.is_empty() {
            return Err(RunError::NoCentroids);
        }

        let k = centroids.len();
        let partition = Partition::new(dataset.len(), workers);
        if partition.dropped() > 0 {
            warn!(
                dropped = partition.dropped(),
                points = partition.total(),
                workers,
                "Dataset size not divisible by worker count, trailing points excluded"
            );
        }

        info!(
            points = partition.distributed_len(),
            workers,
            k,
            max_iterations,
            %rule,
            "Starting distributed run"
        );

        let comms = bootstrap_local(workers, self.options.channel_buffer)?;
        let mut scatter_data = Some(dataset.points().to_vec());
        let mut coordinator = Some(CoordinatorState::new(dataset, centroids, rule));

        let mut tasks = JoinSet::new();
        for mut comm in comms {
            let (role, data) = if comm.is_root() {
                let role = coordinator
                    .take()
                    .map(|state| Role::Coordinator(Box::new(state)))
                    .unwrap_or(Role::Worker);
                (role, scatter_data.take())
            } else {
                (Role::Worker, None)
            };

            tasks.spawn(async move {
                let chunk = comm.scatter(ROOT, data).await?;
                run_rank(&mut comm, role, chunk, max_iterations).await
            });
        }

        let mut root_outcome = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(RunError::RankFailed(e.to_string()));
                }
            };

            debug!(rank = outcome.rank, rounds = outcome.rounds, "Rank finished");
            if outcome.coordinator.is_some() {
                root_outcome = Some(outcome);
            }
        }

        let outcome = root_outcome.ok_or(RunError::MissingCoordinator)?;
        let coordinator = outcome.coordinator.ok_or(RunError::MissingCoordinator)?;
        let (dataset, centroids, assignments) = coordinator.into_parts();
        let degenerate = degenerate_clusters(k, &assignments);

        info!(
            rounds = outcome.rounds,
            converged = outcome.converged,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            degenerate = degenerate.len(),
            "Distributed run finished"
        );

        Ok(ClusterResult {
            centroids,
            assignments,
            rounds: outcome.rounds,
            converged: outcome.converged,
            elapsed: outcome.elapsed,
            degenerate_clusters: degenerate,
            distributed_points: partition.distributed_len(),
            dropped_points: partition.dropped(),
            dataset,
        })
    }
}
