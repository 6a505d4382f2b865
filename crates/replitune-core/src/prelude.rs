//! Convenient re-exports for downstream crates.

pub use crate::config::TunerConfig;
pub use crate::error::{Error, Result};
pub use crate::hash::{hash_serde, hash_str, Hash256};
pub use crate::id::{QueryId, ReplicaId};
pub use crate::index::Index;
pub use crate::report::{ReportId, RoutingTable, TuningReport};
pub use crate::schema::{Column, Table};
pub use crate::workload::{Query, Workload};
