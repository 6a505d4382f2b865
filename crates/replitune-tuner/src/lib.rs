#![forbid(unsafe_code)]
//! replitune-tuner: the three-stage tuning-and-routing pipeline.
//!
//! Responsibilities:
//! - Stage 1 ([`tune`]): cluster-seeded partitioning with iterative
//!   best-fit repartitioning and per-partition index recommendation.
//! - Stage 2 ([`refine`]): balance-aware move/duplicate refinement that
//!   relieves the most loaded replica without raising total cost.
//! - Stage 3 ([`route`]): benefit-first load-aware routing under the
//!   frozen configurations.
//! - The [`Tuner`] driver chaining the stages into a [`TuningReport`].
//!
//! All three stages reference the same replica roster and workload, and
//! every cost estimate is read immediately after the configuration it
//! belongs to was applied — the `&mut Replica` receivers in the oracle
//! crate keep that ordering honest.

pub mod cost;
pub mod error;
pub mod partition;
pub mod refine;
pub mod route;
pub mod tune;

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use replitune_core::config::TunerConfig;
use replitune_core::hash::hash_serde;
use replitune_core::id::ReplicaId;
use replitune_core::index::Index;
use replitune_core::report::TuningReport;
use replitune_core::workload::Workload;
use replitune_oracle::{IndexAdvisor, Replica};

pub use cost::baseline_costs;
pub use error::{Result, TunerError};
pub use partition::Partition;
pub use refine::refine;
pub use route::load_aware_route;
pub use tune::{best_fit_partition, cluster_and_tune, TunedState};

/// Drives the full pipeline against one workload and one replica roster.
pub struct Tuner<'a> {
    workload: &'a Workload,
    replicas: &'a mut [Replica],
    advisor: &'a mut dyn IndexAdvisor,
    config: TunerConfig,
}

impl<'a> Tuner<'a> {
    pub fn new(
        workload: &'a Workload,
        replicas: &'a mut [Replica],
        advisor: &'a mut dyn IndexAdvisor,
        config: TunerConfig,
    ) -> Result<Self> {
        config.validate()?;
        if replicas.is_empty() {
            return Err(TunerError::NoReplicas);
        }
        if workload.is_empty() {
            return Err(TunerError::EmptyWorkload);
        }
        Ok(Self {
            workload,
            replicas,
            advisor,
            config,
        })
    }

    /// Runs all three stages and emits the report. All-or-nothing: any
    /// unrecoverable oracle or advisor failure aborts the run and no
    /// partial routing table is produced.
    pub fn run(self) -> Result<TuningReport> {
        let started_ms = now_ms();
        let workload_hash = hash_serde(&self.workload.fingerprint_view()).map_err(TunerError::Core)?;
        let specs: Vec<_> = self.replicas.iter().map(|r| r.spec().clone()).collect();
        let roster_hash = hash_serde(&specs).map_err(TunerError::Core)?;
        let report = TuningReport::new(workload_hash, roster_hash, started_ms);

        let tuned = cluster_and_tune(self.workload, self.replicas, self.advisor, &self.config)?;

        // The reference replica's baseline is shared by stages 2 and 3.
        let baseline = baseline_costs(&mut self.replicas[0], self.workload)?;

        let refined = refine(
            self.workload,
            self.replicas,
            self.advisor,
            &self.config,
            &baseline,
            tuned,
        )?;

        let routes = load_aware_route(
            self.workload,
            self.replicas,
            &refined.configurations,
            &baseline,
            self.config.skew_threshold,
        )?;

        let configurations: BTreeMap<ReplicaId, Vec<Index>> = self
            .replicas
            .iter()
            .zip(refined.configurations.iter())
            .map(|(replica, config)| (replica.id(), config.clone()))
            .collect();

        info!(
            total_cost = refined.total_cost,
            routed = routes.len(),
            "tuning run complete"
        );

        Ok(report.finish(configurations, routes, refined.total_cost, now_ms()))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
