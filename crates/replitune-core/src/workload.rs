//! Queries, workloads, and the candidate-index similarity metric.
//!
//! A query's *candidate index set* is every non-empty subset of its
//! referenced columns up to `candidate_width` columns. The set is a pure
//! function of the columns and the width, both fixed at construction, and
//! is computed at most once per query.
//!
//! Similarity between two queries is the Jaccard index of their candidate
//! sets. It is symmetric, reflexive, and always within `[0, 1]`; the 0/0
//! case (two queries referencing no indexable columns at all) resolves to
//! 1.0 for byte-identical texts and 0.0 otherwise, never a panic.

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::id::QueryId;
use crate::index::Index;
use crate::schema::Column;

#[derive(Debug, Clone)]
pub struct Query {
    id: QueryId,
    text: String,
    columns: Vec<Column>,
    candidate_width: usize,
    candidates: OnceCell<BTreeSet<Index>>,
}

impl Query {
    /// `candidate_width` caps the width of derived candidate indexes and is
    /// fixed here so the cached derivation stays a pure function.
    pub fn new(
        id: QueryId,
        text: impl Into<String>,
        columns: Vec<Column>,
        candidate_width: usize,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            columns,
            candidate_width: candidate_width.max(1),
            candidates: OnceCell::new(),
        }
    }

    pub fn id(&self) -> QueryId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Every non-empty subset of the referenced columns, up to
    /// `candidate_width` columns per index. Cached after the first call.
    pub fn candidate_indexes(&self) -> &BTreeSet<Index> {
        self.candidates
            .get_or_init(|| subsets_up_to(&self.columns, self.candidate_width))
    }

    /// Jaccard index of the two queries' candidate-index sets, in `[0, 1]`.
    pub fn similarity(&self, other: &Query) -> f64 {
        let ours = self.candidate_indexes();
        let theirs = other.candidate_indexes();

        if ours.is_empty() && theirs.is_empty() {
            // No indexable columns on either side. Textually identical
            // queries are treated as the same query, anything else as
            // maximally dissimilar.
            return if self.text == other.text { 1.0 } else { 0.0 };
        }

        let intersection = ours.intersection(theirs).count();
        let union = ours.len() + theirs.len() - intersection;
        intersection as f64 / union as f64
    }

    /// `1 - similarity`, the metric fed to the clusterer.
    pub fn distance(&self, other: &Query) -> f64 {
        1.0 - self.similarity(other)
    }
}

/// Every non-empty subset of `columns` with at most `max_width` members,
/// as order-preserving indexes.
fn subsets_up_to(columns: &[Column], max_width: usize) -> BTreeSet<Index> {
    let mut out = BTreeSet::new();
    let mut scratch: Vec<Column> = Vec::new();
    combine(columns, max_width, &mut scratch, &mut out);
    out
}

fn combine(rest: &[Column], budget: usize, scratch: &mut Vec<Column>, out: &mut BTreeSet<Index>) {
    if !scratch.is_empty() {
        out.insert(Index::new(scratch.iter().cloned()));
    }
    if budget == 0 {
        return;
    }
    for (i, col) in rest.iter().enumerate() {
        scratch.push(col.clone());
        combine(&rest[i + 1..], budget - 1, scratch, out);
        scratch.pop();
    }
}

/// An ordered collection of queries with stable, unique IDs.
#[derive(Debug, Clone)]
pub struct Workload {
    queries: Vec<Query>,
    by_id: HashMap<QueryId, usize>,
}

impl Workload {
    pub fn new(queries: Vec<Query>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(queries.len());
        for (pos, query) in queries.iter().enumerate() {
            if by_id.insert(query.id(), pos).is_some() {
                return Err(Error::Workload(format!(
                    "duplicate query id {} in workload",
                    query.id()
                )));
            }
        }
        Ok(Self { queries, by_id })
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Query> {
        self.queries.iter()
    }

    pub fn get(&self, id: QueryId) -> Option<&Query> {
        self.by_id.get(&id).map(|&pos| &self.queries[pos])
    }

    /// Position of a query in workload order.
    pub fn position(&self, id: QueryId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// The sorted set of all columns referenced anywhere in the workload.
    pub fn indexable_columns(&self) -> BTreeSet<Column> {
        self.queries
            .iter()
            .flat_map(|q| q.columns().iter().cloned())
            .collect()
    }

    /// One single-column index per indexable column.
    pub fn potential_indexes(&self) -> BTreeSet<Index> {
        self.indexable_columns()
            .into_iter()
            .map(Index::single)
            .collect()
    }

    /// Stable content view for fingerprinting a workload into a report.
    pub fn fingerprint_view(&self) -> impl Serialize + '_ {
        self.queries
            .iter()
            .map(|q| (q.id(), q.text()))
            .collect::<Vec<_>>()
    }
}
