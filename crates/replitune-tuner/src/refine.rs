//! Stage 2: balance-aware refinement.
//!
//! Shrinks the gap between the most and least loaded replicas by moving
//! or duplicating one query at a time off the worst replica, accepting a
//! change only when it strictly lowers total system cost. Each candidate
//! evaluation re-recommends and re-applies configurations as a side
//! effect; that is required for the cost numbers to stay valid.

use tracing::{debug, info, warn};

use replitune_core::config::TunerConfig;
use replitune_core::id::QueryId;
use replitune_core::index::Index;
use replitune_core::workload::Workload;
use replitune_oracle::{IndexAdvisor, Replica};

use crate::cost::{costs_by_replica, partition_cost, replica_cost, resolve};
use crate::error::{Result, TunerError};
use crate::partition::Partition;
use crate::tune::{best_fit_partition, recommend_and_apply, TunedState};

const STAGE: &str = "refine";

/// Refines a Stage-1 state. `baseline` holds per-query no-index costs in
/// workload order (see [`crate::cost::baseline_costs`]); a query is only
/// steered toward replicas where indexing genuinely beats that baseline.
///
/// The returned state never costs more than `start` did.
pub fn refine(
    workload: &Workload,
    replicas: &mut [Replica],
    advisor: &mut dyn IndexAdvisor,
    config: &TunerConfig,
    baseline: &[f64],
    start: TunedState,
) -> Result<TunedState> {
    info!("starting balance-aware refinement (stage 2)");

    if baseline.len() != workload.len() {
        return Err(TunerError::BaselineMismatch {
            stage: STAGE,
            got: baseline.len(),
            want: workload.len(),
        });
    }

    if replicas.len() < 2 {
        debug!("single replica, nothing to relocate");
        return Ok(start);
    }

    // Re-establish the starting configurations so every cost below is
    // read against the state actually under evaluation.
    let mut current = start;
    apply_configurations(replicas, &current.configurations)?;
    current.total_cost = partition_cost(STAGE, workload, replicas, &current.partition)?;

    let mut converged = false;
    for round in 1..=config.max_rounds {
        // The hypothetical evaluations below leave the replicas
        // simulating the duplicate candidate; restore the accepted
        // configurations before reading any cost that refers to
        // `current`.
        apply_configurations(replicas, &current.configurations)?;

        let Some(step) = refinement_step(workload, replicas, &current, baseline)? else {
            converged = true;
            break;
        };

        let (move_partition, duplicate_partition) = step.hypotheticals(&current);

        let (move_configs, move_cost) =
            recommend_and_apply(STAGE, workload, replicas, advisor, &move_partition, config)?;
        let (dup_configs, dup_cost) = recommend_and_apply(
            STAGE,
            workload,
            replicas,
            advisor,
            &duplicate_partition,
            config,
        )?;

        debug!(
            round,
            current = current.total_cost,
            move_cost,
            dup_cost,
            query = %step.query,
            "evaluated move/duplicate"
        );

        let (partition, configurations, total_cost) = if move_cost < dup_cost {
            (move_partition, move_configs, move_cost)
        } else {
            (duplicate_partition, dup_configs, dup_cost)
        };

        if total_cost < current.total_cost {
            current = TunedState {
                configurations,
                partition,
                total_cost,
            };
        } else {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            rounds = config.max_rounds,
            "refinement hit its iteration cap; keeping the last accepted state"
        );
    }

    info!(cost = current.total_cost, "refinement finished");
    Ok(current)
}

/// Applies each replica's slot-aligned configuration.
fn apply_configurations(replicas: &mut [Replica], configurations: &[Vec<Index>]) -> Result<()> {
    for (slot, replica) in replicas.iter_mut().enumerate() {
        replica
            .apply_configuration(&configurations[slot])
            .map_err(|e| TunerError::oracle(STAGE, replica.id(), e))?;
    }
    Ok(())
}

struct RefinementStep {
    worst_slot: usize,
    dest_slot: usize,
    query: QueryId,
}

impl RefinementStep {
    /// MOVE takes the query off the worst replica; DUPLICATE leaves it
    /// there too. Either way it lands on the destination (at most once,
    /// overlap from earlier duplications permitting).
    fn hypotheticals(&self, current: &TunedState) -> (Partition, Partition) {
        let mut move_partition = current.partition.clone();
        move_partition.unassign(self.worst_slot, self.query);
        if !move_partition.contains(self.dest_slot, self.query) {
            move_partition.assign(self.dest_slot, self.query);
        }

        let mut duplicate_partition = current.partition.clone();
        if !duplicate_partition.contains(self.dest_slot, self.query) {
            duplicate_partition.assign(self.dest_slot, self.query);
        }

        (move_partition, duplicate_partition)
    }
}

/// Picks the worst replica, its worst query, and the destination replica,
/// or `None` when nothing is left to relocate.
fn refinement_step(
    workload: &Workload,
    replicas: &mut [Replica],
    current: &TunedState,
    baseline: &[f64],
) -> Result<Option<RefinementStep>> {
    // Highest-cost replica under the current configurations.
    let mut replica_costs = Vec::with_capacity(replicas.len());
    for (slot, replica) in replicas.iter_mut().enumerate() {
        let queries = resolve(STAGE, workload, current.partition.group(slot))?;
        replica_costs.push(replica_cost(STAGE, replica, &queries)?);
    }
    let mut worst_slot = 0;
    for (slot, &cost) in replica_costs.iter().enumerate() {
        if cost > replica_costs[worst_slot] {
            worst_slot = slot;
        }
    }

    // Relocation candidates: queries the worst replica holds that the
    // best-fit assignment also places there.
    let best_fit = best_fit_partition(STAGE, workload, replicas)?;
    let candidates: Vec<QueryId> = current
        .partition
        .group(worst_slot)
        .iter()
        .filter(|&&id| best_fit.contains(worst_slot, id))
        .copied()
        .collect();

    if candidates.is_empty() {
        debug!(worst = worst_slot, "no relocation candidates left");
        return Ok(None);
    }

    // The candidate costing the worst replica the most.
    let candidate_queries = resolve(STAGE, workload, &candidates)?;
    let mut worst_query_pos = 0;
    {
        let replica = &mut replicas[worst_slot];
        let mut worst_cost = f64::NEG_INFINITY;
        for (pos, query) in candidate_queries.iter().enumerate() {
            let cost = replica
                .estimate_cost(query)
                .map_err(|e| TunerError::oracle(STAGE, replica.id(), e))?;
            if cost > worst_cost {
                worst_cost = cost;
                worst_query_pos = pos;
            }
        }
    }
    let query_id = candidates[worst_query_pos];
    let query = candidate_queries[worst_query_pos];
    let query_baseline = baseline[workload.position(query_id).ok_or(TunerError::UnknownQuery {
        stage: STAGE,
        query: query_id,
    })?];

    // Destination: cheapest replica where indexing beats the baseline,
    // falling back to the cheapest other replica overall.
    let query_costs = costs_by_replica(STAGE, replicas, query)?;
    let pick_cheapest = |eligible: &dyn Fn(usize) -> bool| -> Option<usize> {
        let mut dest = None;
        let mut min_cost = f64::INFINITY;
        for slot in 0..query_costs.len() {
            if slot == worst_slot || !eligible(slot) {
                continue;
            }
            if query_costs[slot] < min_cost {
                min_cost = query_costs[slot];
                dest = Some(slot);
            }
        }
        dest
    };

    let dest_slot = pick_cheapest(&|slot| query_costs[slot] < query_baseline)
        .or_else(|| pick_cheapest(&|_| true));

    let Some(dest_slot) = dest_slot else {
        return Ok(None);
    };

    debug!(
        worst = worst_slot,
        dest = dest_slot,
        query = %query_id,
        "selected relocation"
    );

    Ok(Some(RefinementStep {
        worst_slot,
        dest_slot,
        query: query_id,
    }))
}
