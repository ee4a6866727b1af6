//! Assignment of grouping keys to downstream output units.
//!
//! The aggregation stage writes one output unit per grouping key, but never runs more
//! reducers than the run's `maxReducers` allows. When keys outnumber reducers, several
//! keys share a reducer; a key is never split across reducers.

use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::criteria::CompactionCriteria;
use crate::grouping::GroupingKey;

/// Number of reducers for `group_count` distinct keys under `criteria`.
///
/// One reducer per key, capped by `maxReducers` when present, and never fewer than one.
/// A `maxReducers` of zero is treated as a cap of one.
#[must_use]
pub fn reducer_count(group_count: usize, criteria: &CompactionCriteria) -> u64 {
    let wanted = u64::try_from(group_count).unwrap_or(u64::MAX).max(1);
    criteria
        .max_reducers()
        .map_or(wanted, |cap| wanted.min(cap.max(1)))
}

/// Routes grouping keys to reducer indices.
///
/// The assignment is stable for the lifetime of the process: the same key always lands
/// on the same reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    reducers: u64,
}

impl Partitioner {
    /// Creates a partitioner over `reducers` reducers (at least one).
    #[must_use]
    pub fn new(reducers: u64) -> Self {
        Self {
            reducers: reducers.max(1),
        }
    }

    /// Creates a partitioner sized for `group_count` keys under `criteria`.
    #[must_use]
    pub fn for_groups(group_count: usize, criteria: &CompactionCriteria) -> Self {
        Self::new(reducer_count(group_count, criteria))
    }

    /// Number of reducers keys are spread over.
    #[must_use]
    pub const fn reducers(&self) -> u64 {
        self.reducers
    }

    /// The reducer index for `key`, in `0..reducers`.
    #[must_use]
    pub fn partition(&self, key: &GroupingKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish() % self.reducers
    }

    /// Groups `keys` by the reducer they are assigned to.
    #[must_use]
    pub fn assign<'a, I>(&self, keys: I) -> BTreeMap<u64, Vec<GroupingKey>>
    where
        I: IntoIterator<Item = &'a GroupingKey>,
    {
        let mut assignment: BTreeMap<u64, Vec<GroupingKey>> = BTreeMap::new();
        for key in keys {
            assignment
                .entry(self.partition(key))
                .or_default()
                .push(key.clone());
        }
        assignment
    }
}
