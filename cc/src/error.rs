//! Collective error types

use thiserror::Error;

/// Errors raised by collective operations
///
/// Every variant is fatal to the run: there is no retry and no partial
/// recovery once a rank fails to complete a collective.
#[derive(Debug, Error)]
pub enum CollectiveError {
    #[error("Process group must contain at least one rank")]
    EmptyGroup,

    #[error("Rank {rank} is outside a group of {size}")]
    InvalidRank { rank: usize, size: usize },

    #[error("Rank {rank} lost its channel to rank {peer}")]
    ChannelClosed { rank: usize, peer: usize },

    #[error("Root rank {root} called {op} without data")]
    MissingRootData { root: usize, op: &'static str },

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result alias for collective operations
pub type CollectiveResult<T> = std::result::Result<T, CollectiveError>;
