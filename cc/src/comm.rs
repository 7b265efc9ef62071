//! Communicator - one rank's endpoint into the process group

use std::collections::VecDeque;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::debug;

use crate::ROOT;
use crate::error::{CollectiveError, CollectiveResult};
use crate::message::{Envelope, Tag};

/// Wire up a group of `size` ranks living in this process
///
/// Returns one communicator per rank, indexed by rank. Each communicator is
/// meant to be moved into its own task.
pub fn bootstrap_local(size: usize, buffer: usize) -> CollectiveResult<Vec<Communicator>> {
    debug!(size, buffer, "bootstrap_local: called");
    if size == 0 {
        return Err(CollectiveError::EmptyGroup);
    }

    let (senders, inboxes): (Vec<_>, Vec<_>) = (0..size).map(|_| mpsc::channel(buffer.max(1))).unzip();

    let comms = inboxes
        .into_iter()
        .enumerate()
        .map(|(rank, inbox)| Communicator::new(rank, senders.clone(), inbox))
        .collect();

    debug!(size, "bootstrap_local: group ready");
    Ok(comms)
}

/// A rank's handle on the group
///
/// Not cloneable: the inbox belongs to exactly one rank. All collectives take
/// `&mut self` because receiving may hold back messages that arrived early.
pub struct Communicator {
    rank: usize,
    size: usize,

    /// Senders to every other rank (None at our own index)
    peers: Vec<Option<mpsc::Sender<Envelope>>>,

    inbox: mpsc::Receiver<Envelope>,

    /// Messages received before a matching receive was posted
    pending: VecDeque<Envelope>,
}

impl Communicator {
    fn new(rank: usize, senders: Vec<mpsc::Sender<Envelope>>, inbox: mpsc::Receiver<Envelope>) -> Self {
        let size = senders.len();
        let peers = senders
            .into_iter()
            .enumerate()
            .map(|(peer, tx)| (peer != rank).then_some(tx))
            .collect();

        Self {
            rank,
            size,
            peers,
            inbox,
            pending: VecDeque::new(),
        }
    }

    /// This rank's identity within the group
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of ranks in the group
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_root(&self) -> bool {
        self.rank == ROOT
    }

    /// Copy the root's value to every rank
    ///
    /// The root passes `Some(value)` and gets it back; every other rank passes
    /// `None` and receives the root's copy.
    pub async fn broadcast<T>(&mut self, root: usize, value: Option<T>) -> CollectiveResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        debug!(rank = self.rank, root, "broadcast: called");
        self.check_rank(root)?;

        if self.rank != root {
            return self.recv(root, Tag::Broadcast).await;
        }

        let value = value.ok_or(CollectiveError::MissingRootData { root, op: "broadcast" })?;
        let body = serde_json::to_vec(&value)?;
        for peer in self.others(root) {
            self.send_bytes(peer, Tag::Broadcast, body.clone()).await?;
        }

        Ok(value)
    }

    /// Split the root's sequence into `size` contiguous chunks of `len / size`
    ///
    /// Rank `r` receives chunk `r`. The trailing `len % size` elements belong to
    /// no chunk and are dropped.
    pub async fn scatter<T>(&mut self, root: usize, data: Option<Vec<T>>) -> CollectiveResult<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        debug!(rank = self.rank, root, "scatter: called");
        self.check_rank(root)?;

        if self.rank != root {
            return self.recv(root, Tag::Scatter).await;
        }

        let data = data.ok_or(CollectiveError::MissingRootData { root, op: "scatter" })?;
        let chunk_len = data.len() / self.size;
        let dropped = data.len() - chunk_len * self.size;
        if dropped > 0 {
            debug!(rank = self.rank, dropped, chunk_len, "scatter: remainder excluded");
        }

        let mut items = data.into_iter();
        let mut own = Vec::new();
        for peer in 0..self.size {
            let part: Vec<T> = items.by_ref().take(chunk_len).collect();
            if peer == root {
                own = part;
            } else {
                self.send(peer, Tag::Scatter, &part).await?;
            }
        }

        Ok(own)
    }

    /// Concatenate every rank's sequence at the root, in rank order
    ///
    /// Returns `Some` on the root and `None` everywhere else.
    pub async fn gather<T>(&mut self, root: usize, local: Vec<T>) -> CollectiveResult<Option<Vec<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        debug!(rank = self.rank, root, len = local.len(), "gather: called");
        self.check_rank(root)?;

        if self.rank != root {
            self.send(root, Tag::Gather, &local).await?;
            return Ok(None);
        }

        let mut all = Vec::with_capacity(local.len() * self.size);
        let mut local = Some(local);
        for peer in 0..self.size {
            if peer == root {
                all.extend(local.take().unwrap_or_default());
            } else {
                let part: Vec<T> = self.recv(peer, Tag::Gather).await?;
                all.extend(part);
            }
        }

        Ok(Some(all))
    }

    /// Block until every rank of the group has called `barrier`
    pub async fn barrier(&mut self) -> CollectiveResult<()> {
        debug!(rank = self.rank, "barrier: called");

        if self.rank != ROOT {
            self.send(ROOT, Tag::Barrier, &()).await?;
            return self.recv(ROOT, Tag::Release).await;
        }

        for peer in self.others(ROOT) {
            self.recv::<()>(peer, Tag::Barrier).await?;
        }
        for peer in self.others(ROOT) {
            self.send(peer, Tag::Release, &()).await?;
        }

        debug!(rank = self.rank, "barrier: released");
        Ok(())
    }

    fn check_rank(&self, rank: usize) -> CollectiveResult<()> {
        if rank >= self.size {
            return Err(CollectiveError::InvalidRank { rank, size: self.size });
        }
        Ok(())
    }

    fn others(&self, root: usize) -> impl Iterator<Item = usize> + use<> {
        (0..self.size).filter(move |&peer| peer != root)
    }

    async fn send<T: Serialize + ?Sized>(&self, dest: usize, tag: Tag, value: &T) -> CollectiveResult<()> {
        let body = serde_json::to_vec(value)?;
        self.send_bytes(dest, tag, body).await
    }

    async fn send_bytes(&self, dest: usize, tag: Tag, body: Vec<u8>) -> CollectiveResult<()> {
        let closed = CollectiveError::ChannelClosed {
            rank: self.rank,
            peer: dest,
        };
        let Some(tx) = self.peers.get(dest).and_then(Option::as_ref) else {
            return Err(closed);
        };

        tx.send(Envelope::new(self.rank, tag, body)).await.map_err(|_| closed)
    }

    async fn recv<T: DeserializeOwned>(&mut self, source: usize, tag: Tag) -> CollectiveResult<T> {
        let env = self.recv_envelope(source, tag).await?;
        Ok(serde_json::from_slice(&env.body)?)
    }

    async fn recv_envelope(&mut self, source: usize, tag: Tag) -> CollectiveResult<Envelope> {
        let held = self.pending.iter().position(|env| env.matches(source, tag));
        if let Some(env) = held.and_then(|pos| self.pending.remove(pos)) {
            return Ok(env);
        }

        while let Some(env) = self.inbox.recv().await {
            if env.matches(source, tag) {
                return Ok(env);
            }
            debug!(rank = self.rank, from = env.source, tag = ?env.tag, "recv_envelope: holding early message");
            self.pending.push_back(env);
        }

        Err(CollectiveError::ChannelClosed {
            rank: self.rank,
            peer: source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_CHANNEL_BUFFER;
    use std::future::Future;

    async fn run_group<F, Fut, R>(size: usize, f: F) -> Vec<R>
    where
        F: Fn(Communicator) -> Fut,
        Fut: Future<Output = CollectiveResult<R>> + Send + 'static,
        R: Send + 'static,
    {
        let comms = bootstrap_local(size, DEFAULT_CHANNEL_BUFFER).unwrap();
        let handles: Vec<_> = comms.into_iter().map(|comm| tokio::spawn(f(comm))).collect();

        let mut out = Vec::new();
        for handle in handles {
            out.push(handle.await.unwrap().unwrap());
        }
        out
    }

    #[test]
    fn test_bootstrap_empty_group() {
        assert!(matches!(
            bootstrap_local(0, DEFAULT_CHANNEL_BUFFER),
            Err(CollectiveError::EmptyGroup)
        ));
    }

    #[test]
    fn test_bootstrap_assigns_ranks() {
        let comms = bootstrap_local(3, DEFAULT_CHANNEL_BUFFER).unwrap();
        let ranks: Vec<usize> = comms.iter().map(|c| c.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert!(comms.iter().all(|c| c.size() == 3));
        assert!(comms[0].is_root());
        assert!(!comms[1].is_root());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_rank() {
        let results = run_group(4, |mut comm| async move {
            let value = comm.is_root().then(|| vec![3.5f64, -1.25, 7.0]);
            comm.broadcast(ROOT, value).await
        })
        .await;

        for got in results {
            assert_eq!(got, vec![3.5, -1.25, 7.0]);
        }
    }

    #[tokio::test]
    async fn test_broadcast_is_bit_exact() {
        let sent = vec![0.1f64 + 0.2, 1e-300, 845753.123456789, f64::MIN_POSITIVE];
        let expected: Vec<u64> = sent.iter().map(|v| v.to_bits()).collect();

        let results = run_group(3, move |mut comm| {
            let sent = sent.clone();
            async move {
                let value = comm.is_root().then_some(sent);
                comm.broadcast(ROOT, value).await
            }
        })
        .await;

        for got in results {
            let bits: Vec<u64> = got.iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits, expected);
        }
    }

    #[tokio::test]
    async fn test_scatter_drops_remainder() {
        let results = run_group(3, |mut comm| async move {
            let data = comm.is_root().then(|| (0..10).collect::<Vec<u32>>());
            comm.scatter(ROOT, data).await
        })
        .await;

        assert_eq!(results[0], vec![0, 1, 2]);
        assert_eq!(results[1], vec![3, 4, 5]);
        assert_eq!(results[2], vec![6, 7, 8]);
    }

    #[tokio::test]
    async fn test_scatter_fewer_items_than_ranks() {
        let results = run_group(4, |mut comm| async move {
            let data = comm.is_root().then(|| vec![1u8, 2]);
            comm.scatter(ROOT, data).await
        })
        .await;

        assert!(results.iter().all(|chunk| chunk.is_empty()));
    }

    #[tokio::test]
    async fn test_gather_preserves_rank_order() {
        let results = run_group(3, |mut comm| async move {
            let local = vec![comm.rank(); 2];
            comm.gather(ROOT, local).await
        })
        .await;

        assert_eq!(results[0], Some(vec![0, 0, 1, 1, 2, 2]));
        assert_eq!(results[1], None);
        assert_eq!(results[2], None);
    }

    #[tokio::test]
    async fn test_single_rank_group() {
        let results = run_group(1, |mut comm| async move {
            let chunk = comm.scatter(ROOT, Some(vec![1, 2, 3])).await?;
            let all = comm.gather(ROOT, chunk).await?;
            comm.barrier().await?;
            let flag = comm.broadcast(ROOT, Some(true)).await?;
            Ok::<_, CollectiveError>((all, flag))
        })
        .await;

        assert_eq!(results[0], (Some(vec![1, 2, 3]), true));
    }

    #[tokio::test]
    async fn test_repeated_rounds_stay_in_lockstep() {
        let results = run_group(5, |mut comm| async move {
            let mut totals = Vec::new();
            for round in 0..20u64 {
                let base = comm.broadcast(ROOT, comm.is_root().then_some(round * 10)).await?;
                let gathered = comm.gather(ROOT, vec![base + comm.rank() as u64]).await?;
                comm.barrier().await?;
                let total = gathered.map(|values| values.iter().sum::<u64>());
                let total = comm.broadcast(ROOT, total).await?;
                totals.push(total);
            }
            Ok::<_, CollectiveError>(totals)
        })
        .await;

        let expected: Vec<u64> = (0..20u64).map(|round| round * 50 + 10).collect();
        for totals in results {
            assert_eq!(totals, expected);
        }
    }

    #[tokio::test]
    async fn test_invalid_root_rejected() {
        let mut comms = bootstrap_local(2, DEFAULT_CHANNEL_BUFFER).unwrap();
        let err = comms[0].broadcast(7, Some(1u8)).await.unwrap_err();
        assert!(matches!(err, CollectiveError::InvalidRank { rank: 7, size: 2 }));
    }

    #[tokio::test]
    async fn test_root_without_data_rejected() {
        let mut comms = bootstrap_local(2, DEFAULT_CHANNEL_BUFFER).unwrap();
        let err = comms[0].scatter::<u8>(ROOT, None).await.unwrap_err();
        assert!(matches!(err, CollectiveError::MissingRootData { op: "scatter", .. }));
    }

    #[tokio::test]
    async fn test_recv_fails_when_peers_are_gone() {
        let mut comms = bootstrap_local(2, DEFAULT_CHANNEL_BUFFER).unwrap();
        let worker = comms.pop().unwrap();
        let mut root = comms.pop().unwrap();
        drop(worker);

        let err = root.gather(ROOT, vec![1u8]).await.unwrap_err();
        assert!(matches!(err, CollectiveError::ChannelClosed { rank: 0, peer: 1 }));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn scatter_then_gather_returns_distributed_prefix(
                data in proptest::collection::vec(any::<i32>(), 0..64),
                size in 1usize..6,
            ) {
                let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
                let expected = data[..data.len() / size * size].to_vec();

                let results = runtime.block_on(run_group(size, move |mut comm| {
                    let data = comm.is_root().then(|| data.clone());
                    async move {
                        let chunk = comm.scatter(ROOT, data).await?;
                        comm.gather(ROOT, chunk).await
                    }
                }));

                prop_assert_eq!(results[0].clone(), Some(expected));
            }
        }
    }
}
