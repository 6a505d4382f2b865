#![forbid(unsafe_code)]
//! replitune: facade crate re-exporting the workspace members.
//!
//! The integration tests and benches at the repository root drive the
//! full pipeline through the member crates; this facade gives embedders a
//! single dependency with the public surface in one place.

pub use replitune_core::prelude::*;

pub use replitune_cluster::{cluster, cluster_workload, workload_matrix, DistanceMatrix};

pub use replitune_oracle::{
    CostOracle, GreedyAdvisor, IndexAdvisor, OracleError, Replica, ReplicaSpec, RetryPolicy,
    SimOracle,
};

pub use replitune_tuner::{
    baseline_costs, best_fit_partition, cluster_and_tune, load_aware_route, refine, Partition,
    TunedState, Tuner, TunerError,
};
