//! The externally visible artifact of a tuning run.
//!
//! A run emits exactly one report: the per-replica index configurations,
//! the routing table covering every input query once, fingerprints of the
//! inputs it was derived from, and timing. Consumers treat the report as
//! advisory; nothing here creates real indexes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::hash::Hash256;
use crate::id::{QueryId, ReplicaId};
use crate::index::Index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub Uuid);

/// Query → replica assignment produced by the routing stage. Each query
/// appears exactly once; replicas may appear any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable(BTreeMap<QueryId, ReplicaId>);

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query: QueryId, replica: ReplicaId) {
        self.0.insert(query, replica);
    }

    pub fn get(&self, query: QueryId) -> Option<ReplicaId> {
        self.0.get(&query).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueryId, ReplicaId)> + '_ {
        self.0.iter().map(|(q, r)| (*q, *r))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningReport {
    pub id: ReportId,

    /// Stable hash of the (id, text) sequence of the tuned workload.
    pub workload_hash: Hash256,

    /// Stable hash of the replica roster the run was made against.
    pub roster_hash: Hash256,

    /// Recommended index configuration per replica.
    pub configurations: BTreeMap<ReplicaId, Vec<Index>>,

    /// Final query → replica routing decisions.
    pub routes: RoutingTable,

    /// Total estimated workload cost under the final configurations.
    pub total_cost: f64,

    /// Tool version string for provenance.
    pub tool_version: String,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl TuningReport {
    pub fn new(workload_hash: Hash256, roster_hash: Hash256, started_ms: u64) -> Self {
        Self {
            id: ReportId(Uuid::new_v4()),
            workload_hash,
            roster_hash,
            configurations: BTreeMap::new(),
            routes: RoutingTable::new(),
            total_cost: 0.0,
            tool_version: crate::VERSION.to_string(),
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(
        mut self,
        configurations: BTreeMap<ReplicaId, Vec<Index>>,
        routes: RoutingTable,
        total_cost: f64,
        finished_ms: u64,
    ) -> Self {
        self.configurations = configurations;
        self.routes = routes;
        self.total_cost = total_cost;
        self.finished_ms = finished_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_table_round_trips_through_json() {
        let mut table = RoutingTable::new();
        table.insert(QueryId::new(1), ReplicaId::new(0));
        table.insert(QueryId::new(2), ReplicaId::new(1));

        let json = serde_json::to_string(&table).unwrap();
        let back: RoutingTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, back);
        assert_eq!(back.get(QueryId::new(2)), Some(ReplicaId::new(1)));
    }
}
