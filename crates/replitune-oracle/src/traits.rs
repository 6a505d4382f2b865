//! Oracle and advisor traits.
//!
//! One `CostOracle` handle exists per replica and is owned by its
//! [`Replica`](crate::replica::Replica). Both methods below take
//! `&mut self`: applying a configuration and reading costs under it is a
//! read-after-write dependency, and exclusive access makes it impossible
//! for a concurrent reader to observe a configuration it did not apply.
//! Oracles for *different* replicas are independent and may be driven in
//! parallel.

use replitune_core::index::Index;
use replitune_core::schema::Column;
use replitune_core::workload::Query;

use crate::error::Result;
use crate::replica::Replica;

/// What-if cost estimation against one replica.
pub trait CostOracle: Send {
    /// Resets the replica's simulated indexes, then simulates `config`.
    /// There is no incremental diffing; the previous configuration is
    /// always discarded wholesale.
    fn apply_configuration(&mut self, config: &[Index]) -> Result<()>;

    /// Planner cost estimate for `query` under the configuration applied
    /// by the most recent `apply_configuration` call.
    fn estimate_cost(&mut self, query: &Query) -> Result<f64>;

    /// The replica's indexable columns, used during setup.
    fn list_columns(&mut self) -> Result<Vec<Column>>;
}

/// External index-recommendation algorithm.
///
/// `recommend` is a pure function of its inputs modulo the replica's
/// schema. By convention an infeasible budget yields an empty
/// configuration rather than an error; the tuning loop then proceeds with
/// zero indexes on that replica.
///
/// Implementations may drive what-if probes through the replica and are
/// free to leave its simulated configuration in any state; callers always
/// re-apply the configuration they need afterwards.
pub trait IndexAdvisor {
    fn recommend(
        &mut self,
        replica: &mut Replica,
        queries: &[&Query],
        budget_bytes: u64,
        max_index_width: usize,
    ) -> Result<Vec<Index>>;
}
