//! Partitioner - equal contiguous chunks by integer division
//!
//! The dataset is cut into `workers` chunks of `len / workers` points each;
//! the trailing `len % workers` points take no part in the distributed
//! computation. This truncation is a known limitation, not an error.

use std::ops::Range;

/// How a dataset of `total` points splits across `workers` ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    total: usize,
    workers: usize,
}

impl Partition {
    pub fn new(total: usize, workers: usize) -> Self {
        Self { total, workers }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Points per rank
    pub fn chunk_len(&self) -> usize {
        self.total.checked_div(self.workers).unwrap_or(0)
    }

    /// Points that take part in the computation, `floor(total / workers) * workers`
    pub fn distributed_len(&self) -> usize {
        self.chunk_len() * self.workers
    }

    /// Trailing points excluded from every chunk
    pub fn dropped(&self) -> usize {
        self.total - self.distributed_len()
    }

    /// Dataset index range owned by `rank`
    pub fn range(&self, rank: usize) -> Range<usize> {
        let len = self.chunk_len();
        rank * len..(rank + 1) * len
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.workers).map(|rank| self.range(rank))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_even_split() {
        let partition = Partition::new(12, 4);
        assert_eq!(partition.chunk_len(), 3);
        assert_eq!(partition.distributed_len(), 12);
        assert_eq!(partition.dropped(), 0);
        assert_eq!(partition.range(2), 6..9);
    }

    #[test]
    fn test_remainder_is_dropped() {
        let partition = Partition::new(10, 3);
        assert_eq!(partition.chunk_len(), 3);
        assert_eq!(partition.distributed_len(), 9);
        assert_eq!(partition.dropped(), 1);
        assert_eq!(partition.ranges().collect::<Vec<_>>(), vec![0..3, 3..6, 6..9]);
    }

    #[test]
    fn test_fewer_points_than_workers() {
        let partition = Partition::new(2, 5);
        assert_eq!(partition.chunk_len(), 0);
        assert_eq!(partition.distributed_len(), 0);
        assert_eq!(partition.dropped(), 2);
    }

    #[test]
    fn test_zero_workers() {
        let partition = Partition::new(7, 0);
        assert_eq!(partition.chunk_len(), 0);
        assert_eq!(partition.dropped(), 7);
        assert_eq!(partition.ranges().count(), 0);
    }

    proptest! {
        #[test]
        fn prop_distributed_portion(total in 0usize..10_000, workers in 1usize..64) {
            let partition = Partition::new(total, workers);
            prop_assert_eq!(partition.distributed_len(), (total / workers) * workers);
            prop_assert!(partition.dropped() < workers);

            let ranges: Vec<_> = partition.ranges().collect();
            prop_assert_eq!(ranges.len(), workers);
            prop_assert_eq!(ranges.last().map(|r| r.end).unwrap_or(0), partition.distributed_len());
            for pair in ranges.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }
}
