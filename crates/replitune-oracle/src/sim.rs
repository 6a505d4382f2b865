//! Deterministic in-memory cost oracle.
//!
//! Stands in for a live what-if database connector in tests and offline
//! CLI runs. Each query has a base (no-index) cost, either set explicitly
//! or derived stably from its text; a simulated index that references
//! only columns the query touches scales that cost by a speedup factor.
//! The best applicable factor wins, so costs are monotone in the applied
//! configuration and identical across runs.

use std::collections::HashMap;

use replitune_core::hash::hash_str;
use replitune_core::id::QueryId;
use replitune_core::index::Index;
use replitune_core::schema::Column;
use replitune_core::workload::Query;

use crate::error::Result;
use crate::traits::CostOracle;

pub struct SimOracle {
    columns: Vec<Column>,
    base_costs: HashMap<QueryId, f64>,
    speedups: HashMap<Index, f64>,
    default_speedup: f64,
    applied: Vec<Index>,
}

impl SimOracle {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            base_costs: HashMap::new(),
            speedups: HashMap::new(),
            default_speedup: 0.5,
            applied: Vec::new(),
        }
    }

    /// Pins the no-index cost of a query; unpinned queries get a stable
    /// text-derived cost in `[50, 150)`.
    pub fn with_base_cost(mut self, id: QueryId, cost: f64) -> Self {
        self.base_costs.insert(id, cost);
        self
    }

    /// Pins the cost factor applied when `index` serves a query. Factors
    /// below 1.0 model a benefit; factors above 1.0 model an index that
    /// hurts (planner regressions do happen).
    pub fn with_speedup(mut self, index: Index, factor: f64) -> Self {
        self.speedups.insert(index, factor);
        self
    }

    /// Factor used for applicable indexes with no pinned entry.
    pub fn with_default_speedup(mut self, factor: f64) -> Self {
        self.default_speedup = factor;
        self
    }

    fn base_cost(&self, query: &Query) -> f64 {
        if let Some(&cost) = self.base_costs.get(&query.id()) {
            return cost;
        }
        let digest = hash_str(query.text());
        let word = u64::from_le_bytes(digest.as_bytes()[..8].try_into().unwrap_or([0u8; 8]));
        50.0 + (word % 10_000) as f64 / 100.0
    }

    fn factor(&self, index: &Index) -> f64 {
        self.speedups
            .get(index)
            .copied()
            .unwrap_or(self.default_speedup)
    }
}

impl CostOracle for SimOracle {
    fn apply_configuration(&mut self, config: &[Index]) -> Result<()> {
        // Reset-then-simulate: the previous configuration vanishes.
        self.applied = config.to_vec();
        Ok(())
    }

    fn estimate_cost(&mut self, query: &Query) -> Result<f64> {
        let base = self.base_cost(query);
        let best = self
            .applied
            .iter()
            .filter(|idx| idx.applies_to(query.columns()))
            .map(|idx| self.factor(idx))
            .fold(f64::INFINITY, f64::min);

        Ok(if best.is_finite() { base * best } else { base })
    }

    fn list_columns(&mut self) -> Result<Vec<Column>> {
        Ok(self.columns.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Column {
        Column::new("t", name)
    }

    fn query(id: u64, text: &str, cols: &[&str]) -> Query {
        Query::new(
            QueryId::new(id),
            text,
            cols.iter().map(|c| col(c)).collect(),
            2,
        )
    }

    #[test]
    fn unpinned_costs_are_stable_across_calls() {
        let mut oracle = SimOracle::new(vec![col("a")]);
        let q = query(1, "select * from t where a = 1", &["a"]);
        let first = oracle.estimate_cost(&q).unwrap();
        let second = oracle.estimate_cost(&q).unwrap();
        assert_eq!(first, second);
        assert!((50.0..150.0).contains(&first));
    }

    #[test]
    fn applicable_index_scales_cost_and_reset_restores_it() {
        let idx = Index::single(col("a"));
        let mut oracle = SimOracle::new(vec![col("a")])
            .with_base_cost(QueryId::new(1), 100.0)
            .with_speedup(idx.clone(), 0.25);
        let q = query(1, "q1", &["a"]);

        assert_eq!(oracle.estimate_cost(&q).unwrap(), 100.0);

        oracle.apply_configuration(std::slice::from_ref(&idx)).unwrap();
        assert_eq!(oracle.estimate_cost(&q).unwrap(), 25.0);

        oracle.apply_configuration(&[]).unwrap();
        assert_eq!(oracle.estimate_cost(&q).unwrap(), 100.0);
    }

    #[test]
    fn inapplicable_indexes_leave_cost_unchanged() {
        let idx = Index::single(col("b"));
        let mut oracle =
            SimOracle::new(vec![col("a"), col("b")]).with_base_cost(QueryId::new(1), 80.0);
        let q = query(1, "q1", &["a"]);

        oracle.apply_configuration(&[idx]).unwrap();
        assert_eq!(oracle.estimate_cost(&q).unwrap(), 80.0);
    }

    #[test]
    fn best_applicable_factor_wins() {
        let good = Index::single(col("a"));
        let better = Index::new([col("a"), col("b")]);
        let mut oracle = SimOracle::new(vec![col("a"), col("b")])
            .with_base_cost(QueryId::new(1), 100.0)
            .with_speedup(good.clone(), 0.5)
            .with_speedup(better.clone(), 0.2);
        let q = query(1, "q1", &["a", "b"]);

        oracle.apply_configuration(&[good, better]).unwrap();
        assert_eq!(oracle.estimate_cost(&q).unwrap(), 20.0);
    }
}
