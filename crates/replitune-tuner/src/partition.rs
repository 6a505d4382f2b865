//! Slot-aligned workload partitions.
//!
//! A partition maps each replica slot to the queries assigned to it.
//! Groups are exhaustive over the workload but deliberately *not* required
//! to be disjoint: the refinement stage's "duplicate" decision legitimately
//! places one query on two replicas, so overlap is representable without
//! special-casing.

use serde::{Deserialize, Serialize};

use replitune_core::id::QueryId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    groups: Vec<Vec<QueryId>>,
}

impl Partition {
    pub fn new(slots: usize) -> Self {
        Self {
            groups: vec![Vec::new(); slots],
        }
    }

    pub fn from_groups(groups: Vec<Vec<QueryId>>) -> Self {
        Self { groups }
    }

    pub fn slots(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, slot: usize) -> &[QueryId] {
        &self.groups[slot]
    }

    pub fn groups(&self) -> &[Vec<QueryId>] {
        &self.groups
    }

    pub fn contains(&self, slot: usize, query: QueryId) -> bool {
        self.groups[slot].contains(&query)
    }

    pub fn assign(&mut self, slot: usize, query: QueryId) {
        self.groups[slot].push(query);
    }

    /// Removes the first occurrence of `query` from `slot`.
    pub fn unassign(&mut self, slot: usize, query: QueryId) -> bool {
        if let Some(pos) = self.groups[slot].iter().position(|&q| q == query) {
            self.groups[slot].remove(pos);
            true
        } else {
            false
        }
    }

    /// Total assignments across all slots; exceeds the workload size once
    /// duplication has occurred.
    pub fn assignments(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}
