use thiserror::Error;

use replitune_core::id::{QueryId, ReplicaId};
use replitune_oracle::OracleError;

/// Result type local to replitune-tuner.
pub type Result<T> = std::result::Result<T, TunerError>;

/// Failures are reported with enough context to identify the stage
/// (cluster/tune, refine, route) and the replica or query involved.
#[derive(Debug, Error)]
pub enum TunerError {
    #[error("no replicas configured")]
    NoReplicas,

    #[error("empty workload")]
    EmptyWorkload,

    #[error("skew threshold {0} outside [0, 1]")]
    Threshold(f64),

    #[error(transparent)]
    Core(#[from] replitune_core::Error),

    #[error("clustering failed: {0}")]
    Cluster(#[from] replitune_cluster::ClusterError),

    #[error("{stage}: oracle failure on replica {replica}: {source}")]
    Oracle {
        stage: &'static str,
        replica: ReplicaId,
        #[source]
        source: OracleError,
    },

    #[error("{stage}: query {query} missing from workload")]
    UnknownQuery {
        stage: &'static str,
        query: QueryId,
    },

    #[error("{stage}: baseline holds {got} costs for {want} queries")]
    BaselineMismatch {
        stage: &'static str,
        got: usize,
        want: usize,
    },
}

impl TunerError {
    pub(crate) fn oracle(stage: &'static str, replica: ReplicaId, source: OracleError) -> Self {
        Self::Oracle {
            stage,
            replica,
            source,
        }
    }
}
