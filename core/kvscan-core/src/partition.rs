//! Partition ownership: which partitions one scan instance may read.

use crate::error::{ScanError, ScanResult};
use smallvec::SmallVec;

const WORD_BITS: usize = 64;

/// Immutable membership set over `[0, partition_count)`.
///
/// Backed by a bitset; `contains` is O(1). Up to 320 partitions stay inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSet {
    partition_count: usize,
    words: SmallVec<[u64; 5]>,
}

impl PartitionSet {
    /// Empty set over `partition_count` partitions.
    pub fn empty(partition_count: usize) -> Self {
        Self {
            partition_count,
            words: SmallVec::from_elem(0, partition_count.div_ceil(WORD_BITS)),
        }
    }

    /// Set containing every partition.
    pub fn all(partition_count: usize) -> Self {
        let mut set = Self::empty(partition_count);
        for id in 0..partition_count {
            set.insert(id);
        }
        set
    }

    /// Set containing `ids`. Every id must be below `partition_count`.
    pub fn from_ids<I>(partition_count: usize, ids: I) -> ScanResult<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut set = Self::empty(partition_count);
        for id in ids {
            if id >= partition_count {
                return Err(ScanError::InvalidArguments(format!(
                    "partition {id} out of range ({partition_count})"
                )));
            }
            set.insert(id);
        }
        Ok(set)
    }

    fn insert(&mut self, id: usize) {
        self.words[id / WORD_BITS] |= 1u64 << (id % WORD_BITS);
    }

    pub fn contains(&self, id: usize) -> bool {
        id < self.partition_count && self.words[id / WORD_BITS] & (1u64 << (id % WORD_BITS)) != 0
    }

    /// Size of the id space, not the number of members.
    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Member ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.partition_count).filter(move |id| self.contains(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn membership() {
        let set = PartitionSet::from_ids(4, [0, 2]).unwrap();
        assert!(set.contains(0));
        assert!(!set.contains(1));
        assert!(set.contains(2));
        assert!(!set.contains(3));
        assert!(!set.contains(100));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn out_of_range_id_rejected() {
        assert!(matches!(
            PartitionSet::from_ids(4, [4]),
            Err(ScanError::InvalidArguments(_))
        ));
    }

    #[test]
    fn empty_and_all() {
        assert!(PartitionSet::empty(271).is_empty());
        assert_eq!(PartitionSet::all(271).len(), 271);
        assert!(PartitionSet::empty(0).is_empty());
    }

    proptest! {
        #[test]
        fn iter_matches_input(count in 1usize..400, ids in prop::collection::btree_set(0usize..400, 0..50)) {
            let ids: Vec<usize> = ids.into_iter().filter(|id| *id < count).collect();
            let set = PartitionSet::from_ids(count, ids.clone()).unwrap();
            prop_assert_eq!(set.iter().collect::<Vec<_>>(), ids.clone());
            prop_assert_eq!(set.len(), ids.len());
        }
    }
}
