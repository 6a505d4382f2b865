//! Stage 1: similarity-clustered seeding with iterative best-fit tuning.

use tracing::{debug, info, warn};

use replitune_cluster::cluster_workload;
use replitune_core::config::TunerConfig;
use replitune_core::id::QueryId;
use replitune_core::index::Index;
use replitune_core::workload::Workload;
use replitune_oracle::{IndexAdvisor, Replica};

use crate::cost::{costs_by_replica, replica_cost, resolve};
use crate::error::Result;
use crate::partition::Partition;

const STAGE: &str = "cluster/tune";

/// One accepted (configurations, partition, cost) state. Configurations
/// are slot-aligned with the replica roster, like partitions.
#[derive(Debug, Clone)]
pub struct TunedState {
    pub configurations: Vec<Vec<Index>>,
    pub partition: Partition,
    pub total_cost: f64,
}

/// Recommends and applies a configuration per replica for `partition`,
/// returning the configurations and the partition's total cost.
///
/// Each replica's share is costed immediately after its configuration is
/// applied, so every estimate is read under the configuration it belongs
/// to.
pub(crate) fn recommend_and_apply(
    stage: &'static str,
    workload: &Workload,
    replicas: &mut [Replica],
    advisor: &mut dyn IndexAdvisor,
    partition: &Partition,
    config: &TunerConfig,
) -> Result<(Vec<Vec<Index>>, f64)> {
    let mut configurations = Vec::with_capacity(replicas.len());
    let mut total = 0.0;

    for (slot, replica) in replicas.iter_mut().enumerate() {
        let queries = resolve(stage, workload, partition.group(slot))?;
        let recommended = advisor
            .recommend(
                replica,
                &queries,
                config.budget_bytes,
                config.max_index_width,
            )
            .map_err(|e| crate::error::TunerError::oracle(stage, replica.id(), e))?;

        replica
            .apply_configuration(&recommended)
            .map_err(|e| crate::error::TunerError::oracle(stage, replica.id(), e))?;

        total += replica_cost(stage, replica, &queries)?;
        configurations.push(recommended);
    }

    Ok((configurations, total))
}

/// Assigns every query to the replica answering it cheapest under the
/// replicas' *currently applied* configurations. Ties go to the first
/// replica in roster order.
pub fn best_fit_partition(
    stage: &'static str,
    workload: &Workload,
    replicas: &mut [Replica],
) -> Result<Partition> {
    let mut partition = Partition::new(replicas.len());

    for query in workload.iter() {
        let costs = costs_by_replica(stage, replicas, query)?;
        let mut best = 0;
        for (slot, &cost) in costs.iter().enumerate() {
            if cost < costs[best] {
                best = slot;
            }
        }
        partition.assign(best, query.id());
    }

    Ok(partition)
}

/// Stage 1: seed partitions by clustering, then alternate between
/// per-partition index recommendation and best-fit reassignment until the
/// total cost stops improving.
///
/// The best-fit partition is always derived against freshly applied
/// configurations, and the returned state is the best-cost configuration
/// *with its matching partition*.
pub fn cluster_and_tune(
    workload: &Workload,
    replicas: &mut [Replica],
    advisor: &mut dyn IndexAdvisor,
    config: &TunerConfig,
) -> Result<TunedState> {
    info!("starting cluster-and-tune (stage 1)");

    let groups = cluster_workload(workload, replicas.len())?;
    let queries = workload.queries();
    let seeded: Vec<Vec<QueryId>> = groups
        .into_iter()
        .map(|group| group.into_iter().map(|pos| queries[pos].id()).collect())
        .collect();
    let partition = Partition::from_groups(seeded);

    let (configurations, total_cost) =
        recommend_and_apply(STAGE, workload, replicas, advisor, &partition, config)?;
    let mut best = TunedState {
        configurations,
        partition,
        total_cost,
    };
    debug!(cost = best.total_cost, "seed partition tuned");

    let mut converged = false;
    for round in 1..=config.max_rounds {
        let next_partition = best_fit_partition(STAGE, workload, replicas)?;
        let (next_configurations, next_cost) =
            recommend_and_apply(STAGE, workload, replicas, advisor, &next_partition, config)?;

        debug!(
            round,
            next_cost,
            best_cost = best.total_cost,
            "best-fit tuning round"
        );

        if next_cost < best.total_cost {
            best = TunedState {
                configurations: next_configurations,
                partition: next_partition,
                total_cost: next_cost,
            };
        } else {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            rounds = config.max_rounds,
            "tuning loop hit its iteration cap; keeping the best state found"
        );
    }

    info!(cost = best.total_cost, "cluster-and-tune finished");
    Ok(best)
}
