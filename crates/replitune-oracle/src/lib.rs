#![forbid(unsafe_code)]
//! replitune-oracle: the seam between the tuner and its external
//! collaborators.
//!
//! Responsibilities:
//! - The [`CostOracle`] and [`IndexAdvisor`] traits: "apply this simulated
//!   configuration, then estimate costs" and "recommend indexes for this
//!   query set under a budget".
//! - The [`Replica`] capability object. Each replica owns its oracle
//!   handle and its currently simulated configuration; every cost read
//!   goes through `&mut Replica`, so a configuration change and the reads
//!   depending on it cannot be reordered or interleaved.
//! - Bounded-backoff retry for oracle round trips.
//! - In-memory simulated backends ([`SimOracle`], [`GreedyAdvisor`]) used
//!   by the tests and the offline CLI; a real what-if database connector
//!   plugs in behind the same traits.

pub mod advisor;
pub mod error;
pub mod replica;
pub mod retry;
pub mod sim;
pub mod traits;

pub use advisor::GreedyAdvisor;
pub use error::{OracleError, Result};
pub use replica::{Replica, ReplicaSpec};
pub use retry::RetryPolicy;
pub use sim::SimOracle;
pub use traits::{CostOracle, IndexAdvisor};
