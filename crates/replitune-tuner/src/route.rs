//! Stage 3: benefit-first load-aware routing.
//!
//! With the configurations frozen, each query is assigned a destination
//! replica in a single sequential pass. The cheapest replica is the
//! default; a costlier replica steals the route only while it still beats
//! the query's no-index baseline *and* its accumulated load trails the
//! cheapest replica's by more than the skew threshold allows. Loads
//! persist and grow across the pass, so this is an order-dependent greedy
//! assignment, not a global optimum — and rerunning it with identical
//! inputs yields an identical table.

use tracing::{debug, info};

use replitune_core::index::Index;
use replitune_core::report::RoutingTable;
use replitune_core::workload::Workload;
use replitune_oracle::Replica;

use crate::cost::costs_by_replica;
use crate::error::{Result, TunerError};

const STAGE: &str = "route";

/// Routes every query in workload order under the final per-replica
/// `configurations` (slot-aligned with `replicas`, applied once up
/// front). `baseline` holds per-query no-index costs in workload order;
/// `threshold` is the skew tolerance `t ∈ [0, 1]`.
pub fn load_aware_route(
    workload: &Workload,
    replicas: &mut [Replica],
    configurations: &[Vec<Index>],
    baseline: &[f64],
    threshold: f64,
) -> Result<RoutingTable> {
    if replicas.is_empty() {
        return Err(TunerError::NoReplicas);
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(TunerError::Threshold(threshold));
    }
    if baseline.len() != workload.len() {
        return Err(TunerError::BaselineMismatch {
            stage: STAGE,
            got: baseline.len(),
            want: workload.len(),
        });
    }

    info!(threshold, "starting load-aware routing (stage 3)");

    for (slot, replica) in replicas.iter_mut().enumerate() {
        replica
            .apply_configuration(&configurations[slot])
            .map_err(|e| TunerError::oracle(STAGE, replica.id(), e))?;
    }

    let mut loads = vec![0.0_f64; replicas.len()];
    let mut table = RoutingTable::new();

    for (pos, query) in workload.iter().enumerate() {
        let costs = costs_by_replica(STAGE, replicas, query)?;
        let choice = route_one(&costs, &loads, baseline[pos], threshold);

        debug!(query = %query.id(), replica = %replicas[choice].id(), cost = costs[choice], "routed");

        table.insert(query.id(), replicas[choice].id());
        loads[choice] += costs[choice];
    }

    Ok(table)
}

/// Routes a single query given its per-replica costs and the running load
/// accumulators. Replicas are walked in ascending-cost order (stable, so
/// equal costs keep roster order); each one that beats the baseline and
/// passes the skew check takes over the route.
fn route_one(costs: &[f64], loads: &[f64], baseline: f64, threshold: f64) -> usize {
    let mut order: Vec<usize> = (0..costs.len()).collect();
    order.sort_by(|&a, &b| {
        costs[a]
            .partial_cmp(&costs[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let cheapest = order[0];
    let mut route = cheapest;

    for &slot in &order[1..] {
        if costs[slot] < baseline && skew_allows(loads[slot], loads[cheapest], threshold) {
            route = slot;
        }
    }

    route
}

/// Whether routing to a replica with `candidate` accumulated load is
/// acceptable when the cheapest replica carries `cheapest`.
///
/// The 0/0 case (no load anywhere yet) carries no skew evidence and is
/// treated as passing — except at `t = 0`, which pins strict
/// minimum-cost routing under any load distribution.
fn skew_allows(candidate: f64, cheapest: f64, threshold: f64) -> bool {
    if cheapest == 0.0 {
        candidate == 0.0 && threshold > 0.0
    } else {
        candidate / cheapest < threshold
    }
}
