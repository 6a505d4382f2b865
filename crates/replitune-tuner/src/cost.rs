//! Cost accounting over replicas and partitions.
//!
//! Every helper here reads costs under whatever configuration each replica
//! currently has applied; callers are responsible for applying the
//! configuration they mean to evaluate first.

use replitune_core::id::QueryId;
use replitune_core::workload::{Query, Workload};
use replitune_oracle::Replica;

use crate::error::{Result, TunerError};
use crate::partition::Partition;

pub(crate) fn resolve<'w>(
    stage: &'static str,
    workload: &'w Workload,
    ids: &[QueryId],
) -> Result<Vec<&'w Query>> {
    ids.iter()
        .map(|&id| {
            workload
                .get(id)
                .ok_or(TunerError::UnknownQuery { stage, query: id })
        })
        .collect()
}

/// Sum of the replica's estimates for `queries` under its applied
/// configuration.
pub(crate) fn replica_cost(
    stage: &'static str,
    replica: &mut Replica,
    queries: &[&Query],
) -> Result<f64> {
    let mut total = 0.0;
    for query in queries {
        total += replica
            .estimate_cost(query)
            .map_err(|e| TunerError::oracle(stage, replica.id(), e))?;
    }
    Ok(total)
}

/// Total cost of a partition: each replica's share under its currently
/// applied configuration.
pub(crate) fn partition_cost(
    stage: &'static str,
    workload: &Workload,
    replicas: &mut [Replica],
    partition: &Partition,
) -> Result<f64> {
    let mut total = 0.0;
    for (slot, replica) in replicas.iter_mut().enumerate() {
        let queries = resolve(stage, workload, partition.group(slot))?;
        total += replica_cost(stage, replica, &queries)?;
    }
    Ok(total)
}

/// One query's estimate on every replica, in roster order.
pub(crate) fn costs_by_replica(
    stage: &'static str,
    replicas: &mut [Replica],
    query: &Query,
) -> Result<Vec<f64>> {
    replicas
        .iter_mut()
        .map(|replica| {
            replica
                .estimate_cost(query)
                .map_err(|e| TunerError::oracle(stage, replica.id(), e))
        })
        .collect()
}

/// Per-query costs with no indexes applied, in workload order.
///
/// Uses (and resets) the given reference replica; computed once per run
/// and shared between the refinement and routing stages.
pub fn baseline_costs(reference: &mut Replica, workload: &Workload) -> Result<Vec<f64>> {
    const STAGE: &str = "baseline";
    reference
        .reset()
        .map_err(|e| TunerError::oracle(STAGE, reference.id(), e))?;

    workload
        .iter()
        .map(|query| {
            reference
                .estimate_cost(query)
                .map_err(|e| TunerError::oracle(STAGE, reference.id(), e))
        })
        .collect()
}
