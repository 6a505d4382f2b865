#![forbid(unsafe_code)]
//! replitune-cluster: workload clustering (metric → groups).
//!
//! Responsibilities:
//! - Build the full pairwise distance matrix over a workload using the
//!   candidate-index Jaccard metric from core.
//! - Cut a complete-linkage agglomerative merge tree at exactly `k`
//!   groups, one per replica slot.
//!
//! The linkage procedure is implemented directly rather than through a
//! clustering library: the contract is "distance matrix in, `k` disjoint
//! order-independent groups out", and label-indexing conventions of
//! external backends have bitten this pipeline before.
//!
//! **No oracle traffic** here. Distances are pure functions of the
//! workload; the O(m²) matrix build is the asymptotic hot spot and is
//! benched at the repository root.

pub mod linkage;
pub mod matrix;

pub use linkage::{cluster, cluster_workload, ClusterError};
pub use matrix::{workload_matrix, DistanceMatrix};
