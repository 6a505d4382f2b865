//! Greedy what-if index advisor.
//!
//! A small benefit-per-byte greedy selection over the query set's
//! candidate indexes: probe each remaining candidate on top of the
//! already-selected set, keep the one with the best cost improvement per
//! byte, stop when nothing improves or the budget is spent. The byte
//! footprint is a coarse width-based model; a production deployment
//! would substitute catalog statistics behind the same trait.

use std::collections::BTreeSet;

use tracing::debug;

use replitune_core::index::Index;
use replitune_core::workload::Query;

use crate::error::Result;
use crate::replica::Replica;
use crate::traits::IndexAdvisor;

pub struct GreedyAdvisor {
    /// Assumed on-disk footprint per key column.
    pub bytes_per_column: u64,
}

impl Default for GreedyAdvisor {
    fn default() -> Self {
        Self {
            bytes_per_column: 64 * 1024 * 1024, // 64 MiB
        }
    }
}

impl GreedyAdvisor {
    fn index_size(&self, index: &Index) -> u64 {
        index.width() as u64 * self.bytes_per_column
    }

    fn workload_cost(replica: &mut Replica, queries: &[&Query]) -> Result<f64> {
        let mut total = 0.0;
        for query in queries {
            total += replica.estimate_cost(query)?;
        }
        Ok(total)
    }
}

impl IndexAdvisor for GreedyAdvisor {
    fn recommend(
        &mut self,
        replica: &mut Replica,
        queries: &[&Query],
        budget_bytes: u64,
        max_index_width: usize,
    ) -> Result<Vec<Index>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let candidates: BTreeSet<Index> = queries
            .iter()
            .flat_map(|q| q.candidate_indexes().iter().cloned())
            .filter(|idx| idx.width() <= max_index_width)
            .collect();

        replica.reset()?;
        let mut current_total = Self::workload_cost(replica, queries)?;

        let mut selected: Vec<Index> = Vec::new();
        let mut spent = 0u64;

        loop {
            let mut best: Option<(Index, u64, f64, f64)> = None;

            for candidate in &candidates {
                if selected.contains(candidate) {
                    continue;
                }
                let size = self.index_size(candidate);
                if spent + size > budget_bytes {
                    continue;
                }

                let mut trial = selected.clone();
                trial.push(candidate.clone());
                replica.apply_configuration(&trial)?;
                let total = Self::workload_cost(replica, queries)?;

                let gain = current_total - total;
                if gain <= 0.0 {
                    continue;
                }
                let score = gain / size as f64;
                // Strict improvement keeps ties on the earlier candidate
                // in index order, so recommendations are deterministic.
                if best.as_ref().map_or(true, |(_, _, _, s)| score > *s) {
                    best = Some((candidate.clone(), size, total, score));
                }
            }

            match best {
                Some((candidate, size, total, _)) => {
                    debug!(index = %candidate, spent, "advisor selected index");
                    selected.push(candidate);
                    spent += size;
                    current_total = total;
                }
                None => break,
            }
        }

        // Leave the replica simulating what we recommend.
        replica.apply_configuration(&selected)?;
        Ok(selected)
    }
}
