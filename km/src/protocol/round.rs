//! Per-round state replicated on every rank

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Continue/stop decision broadcast by the coordinator at the end of a round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    #[default]
    Continue,
    Stop,
}

/// Loop bookkeeping held independently by every rank
///
/// The iteration counter is decremented identically on each rank, so it never
/// needs to be communicated; only the convergence decision travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundState {
    pub iterations_remaining: u32,
    pub converged: bool,
    /// Rounds started so far
    pub rounds: u32,
}

impl RoundState {
    pub fn new(max_iterations: u32) -> Self {
        debug!(max_iterations, "RoundState::new: called");
        Self {
            iterations_remaining: max_iterations,
            converged: false,
            rounds: 0,
        }
    }

    /// Whether another round should start
    pub fn should_continue(&self) -> bool {
        self.iterations_remaining != 0 && !self.converged
    }

    pub fn begin_round(&mut self) -> u32 {
        self.rounds += 1;
        self.rounds
    }

    /// Count one round against the iteration cap
    pub fn tick(&mut self) {
        self.iterations_remaining = self.iterations_remaining.saturating_sub(1);
    }

    /// Apply the signal received from the coordinator
    pub fn observe(&mut self, signal: Signal) {
        self.converged = signal == Signal::Stop;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_cap_runs_nothing() {
        assert!(!RoundState::new(0).should_continue());
    }

    #[test]
    fn test_cap_bounds_rounds() {
        let mut state = RoundState::new(3);
        let mut rounds = 0;
        while state.should_continue() {
            state.begin_round();
            state.tick();
            state.observe(Signal::Continue);
            rounds += 1;
        }
        assert_eq!(rounds, 3);
        assert_eq!(state.rounds, 3);
        assert!(!state.converged);
    }

    #[test]
    fn test_stop_signal_ends_loop() {
        let mut state = RoundState::new(400);
        state.begin_round();
        state.tick();
        state.observe(Signal::Stop);
        assert!(state.converged);
        assert!(!state.should_continue());
        assert_eq!(state.iterations_remaining, 399);
    }
}
