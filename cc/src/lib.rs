//! Collective - message passing over a fixed group of ranks
//!
//! A process group is a static set of ranks wired together with point-to-point
//! channels. Every rank owns one [`Communicator`]; the collective operations are
//! built on top of the point-to-point layer and must be called by every rank of
//! the group in the same order:
//!
//! - **broadcast:** root value copied to every rank
//! - **scatter:** root sequence split into equal contiguous chunks, one per rank
//! - **gather:** per-rank sequences concatenated at the root in rank order
//! - **barrier:** no rank leaves until every rank has arrived
//!
//! # Example
//!
//! ```ignore
//! use collective::{ROOT, bootstrap_local};
//!
//! let comms = bootstrap_local(4, 64)?;
//! for mut comm in comms {
//!     tokio::spawn(async move {
//!         let data = comm.is_root().then(|| (0..8).collect::<Vec<u32>>());
//!         let chunk = comm.scatter(ROOT, data).await?;
//!         let all = comm.gather(ROOT, chunk).await?;
//!         comm.barrier().await
//!     });
//! }
//! ```

mod comm;
mod error;
mod message;

pub use comm::{Communicator, bootstrap_local};
pub use error::{CollectiveError, CollectiveResult};
pub use message::{Envelope, Tag};

/// Rank that owns the canonical data for rooted collectives
pub const ROOT: usize = 0;

/// Default per-rank inbox capacity
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;
