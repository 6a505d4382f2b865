//! The per-replica capability object.

use serde::{Deserialize, Serialize};

use replitune_core::id::ReplicaId;
use replitune_core::index::Index;
use replitune_core::schema::Column;
use replitune_core::workload::Query;

use crate::error::Result;
use crate::retry::{with_retry, RetryPolicy};
use crate::traits::CostOracle;

/// Connection parameters for one read replica.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaSpec {
    pub id: ReplicaId,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl ReplicaSpec {
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.dbname, self.user, self.password
        )
    }
}

/// A replica owns its oracle handle and its currently simulated index
/// configuration. Exactly one configuration is active at a time; cost
/// numbers are only meaningful immediately after the matching
/// configuration was applied, which the `&mut` receivers enforce.
pub struct Replica {
    spec: ReplicaSpec,
    oracle: Box<dyn CostOracle>,
    configuration: Vec<Index>,
    retry: RetryPolicy,
}

impl Replica {
    pub fn new(spec: ReplicaSpec, oracle: Box<dyn CostOracle>, retry: RetryPolicy) -> Self {
        Self {
            spec,
            oracle,
            configuration: Vec::new(),
            retry,
        }
    }

    pub fn id(&self) -> ReplicaId {
        self.spec.id
    }

    pub fn spec(&self) -> &ReplicaSpec {
        &self.spec
    }

    /// The configuration most recently applied through this handle.
    pub fn configuration(&self) -> &[Index] {
        &self.configuration
    }

    /// Destructive reset-then-simulate. The previous configuration is
    /// discarded wholesale; there is no incremental diffing.
    pub fn apply_configuration(&mut self, config: &[Index]) -> Result<()> {
        let oracle = &mut self.oracle;
        with_retry(&self.retry, "apply_configuration", || {
            oracle.apply_configuration(config)
        })?;
        self.configuration = config.to_vec();
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.apply_configuration(&[])
    }

    /// Planner cost estimate under the currently applied configuration.
    pub fn estimate_cost(&mut self, query: &Query) -> Result<f64> {
        let oracle = &mut self.oracle;
        with_retry(&self.retry, "estimate_cost", || oracle.estimate_cost(query))
    }

    pub fn list_columns(&mut self) -> Result<Vec<Column>> {
        let oracle = &mut self.oracle;
        with_retry(&self.retry, "list_columns", || oracle.list_columns())
    }
}

impl std::fmt::Debug for Replica {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replica")
            .field("spec", &self.spec)
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}
