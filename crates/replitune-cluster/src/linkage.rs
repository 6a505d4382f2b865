//! Complete-linkage agglomerative clustering cut at `k` groups.

use thiserror::Error;

use replitune_core::workload::Workload;

use crate::matrix::{workload_matrix, DistanceMatrix};

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cannot cluster into zero groups")]
    ZeroGroups,
}

/// Groups the items of `matrix` into exactly `k` disjoint clusters.
///
/// Starts from singletons and repeatedly merges the pair of clusters with
/// the smallest complete-linkage distance (the maximum pairwise distance
/// between their members) until `k` clusters remain. Ties break toward
/// the lowest cluster pair, so the grouping is deterministic for a fixed
/// matrix.
///
/// Fewer items than groups degenerates to singletons padded with empty
/// groups; callers treat non-emptiness as best-effort.
pub fn cluster(matrix: &DistanceMatrix, k: usize) -> Result<Vec<Vec<usize>>, ClusterError> {
    if k == 0 {
        return Err(ClusterError::ZeroGroups);
    }

    let mut clusters: Vec<Vec<usize>> = (0..matrix.len()).map(|i| vec![i]).collect();

    while clusters.len() > k {
        let (mut best_a, mut best_b) = (0, 1);
        let mut best_dist = f64::INFINITY;

        for a in 0..clusters.len() {
            for b in (a + 1)..clusters.len() {
                let dist = linkage_distance(matrix, &clusters[a], &clusters[b]);
                if dist < best_dist {
                    best_dist = dist;
                    best_a = a;
                    best_b = b;
                }
            }
        }

        let merged = clusters.remove(best_b);
        clusters[best_a].extend(merged);
    }

    while clusters.len() < k {
        clusters.push(Vec::new());
    }

    Ok(clusters)
}

/// Complete linkage: the farthest pair of members decides.
fn linkage_distance(matrix: &DistanceMatrix, a: &[usize], b: &[usize]) -> f64 {
    let mut worst = 0.0_f64;
    for &i in a {
        for &j in b {
            worst = worst.max(matrix.get(i, j));
        }
    }
    worst
}

/// Clusters a workload into `k` groups of workload positions, one per
/// replica slot.
pub fn cluster_workload(workload: &Workload, k: usize) -> Result<Vec<Vec<usize>>, ClusterError> {
    cluster(&workload_matrix(workload), k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use replitune_core::id::QueryId;
    use replitune_core::schema::Column;
    use replitune_core::workload::{Query, Workload};

    fn matrix_from(rows: &[&[f64]]) -> DistanceMatrix {
        let n = rows.len();
        DistanceMatrix::from_fn(n, |i, j| rows[i][j])
    }

    #[test]
    fn fixed_matrix_yields_exactly_k_disjoint_groups() {
        // Two tight pairs (0,1) and (2,3), and 4 far from everything.
        let m = matrix_from(&[
            &[0.0, 0.1, 0.9, 0.9, 0.8],
            &[0.1, 0.0, 0.9, 0.9, 0.8],
            &[0.9, 0.9, 0.0, 0.1, 0.8],
            &[0.9, 0.9, 0.1, 0.0, 0.8],
            &[0.8, 0.8, 0.8, 0.8, 0.0],
        ]);

        let groups = cluster(&m, 3).unwrap();
        assert_eq!(groups.len(), 3);

        let mut seen: Vec<usize> = groups.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);

        let find = |item: usize| groups.iter().position(|g| g.contains(&item)).unwrap();
        assert_eq!(find(0), find(1));
        assert_eq!(find(2), find(3));
        assert_ne!(find(0), find(2));
        assert_ne!(find(4), find(0));
        assert_ne!(find(4), find(2));
    }

    #[test]
    fn clustering_is_order_independent_for_a_fixed_matrix() {
        let m = matrix_from(&[
            &[0.0, 0.2, 0.7],
            &[0.2, 0.0, 0.6],
            &[0.7, 0.6, 0.0],
        ]);
        let a = cluster(&m, 2).unwrap();
        let b = cluster(&m, 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fewer_items_than_groups_pads_with_empty_groups() {
        let m = matrix_from(&[&[0.0, 0.5], &[0.5, 0.0]]);
        let groups = cluster(&m, 4).unwrap();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups.iter().filter(|g| !g.is_empty()).count(), 2);
    }

    #[test]
    fn zero_groups_is_an_error() {
        let m = matrix_from(&[&[0.0]]);
        assert!(cluster(&m, 0).is_err());
    }

    #[test]
    fn identical_column_sets_cluster_together() {
        // Two queries over the same {x, y} columns collapse into a single
        // cluster when cut at one group.
        let cols = || vec![Column::new("t", "x"), Column::new("t", "y")];
        let w = Workload::new(vec![
            Query::new(QueryId::new(1), "select a", cols(), 2),
            Query::new(QueryId::new(2), "select b", cols(), 2),
        ])
        .unwrap();

        let groups = cluster_workload(&w, 1).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }
}
