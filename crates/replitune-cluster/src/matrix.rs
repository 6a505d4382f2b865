//! Condensed symmetric distance matrix.

use replitune_core::workload::Workload;
use serde::{Deserialize, Serialize};

/// Pairwise distances over `n` items, stored as the upper triangle.
/// Diagonal entries are implicitly zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Build from a distance function over item positions. `f` is called
    /// once per unordered pair `(i, j)` with `i < j`.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                data.push(f(i, j));
            }
        }
        Self { n, data }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.n && j < self.n);
        if i == j {
            return 0.0;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        // Offset of row `lo` in the condensed triangle, then column.
        let row_start = lo * self.n - lo * (lo + 1) / 2;
        self.data[row_start + (hi - lo - 1)]
    }
}

/// The m×m candidate-index distance matrix for a workload.
pub fn workload_matrix(workload: &Workload) -> DistanceMatrix {
    let queries = workload.queries();
    DistanceMatrix::from_fn(queries.len(), |i, j| queries[i].distance(&queries[j]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condensed_lookup_is_symmetric_with_zero_diagonal() {
        let m = DistanceMatrix::from_fn(4, |i, j| (i * 10 + j) as f64);
        for i in 0..4 {
            assert_eq!(m.get(i, i), 0.0);
            for j in 0..4 {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(1, 3), 13.0);
        assert_eq!(m.get(2, 3), 23.0);
    }
}
