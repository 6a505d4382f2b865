//! Shared builders for the integration tests.

#![allow(dead_code)]

use replitune_core::id::{QueryId, ReplicaId};
use replitune_core::index::Index;
use replitune_core::schema::Column;
use replitune_core::workload::{Query, Workload};
use replitune_oracle::{Replica, ReplicaSpec, RetryPolicy, SimOracle};

pub fn col(name: &str) -> Column {
    Column::new("t", name)
}

pub fn index(names: &[&str]) -> Index {
    Index::new(names.iter().map(|n| col(n)))
}

pub fn query(id: u64, cols: &[&str]) -> Query {
    Query::new(
        QueryId::new(id),
        format!("select * from t where q{id}"),
        cols.iter().map(|c| col(c)).collect(),
        2,
    )
}

pub fn workload(queries: Vec<Query>) -> Workload {
    Workload::new(queries).expect("test workload ids are unique")
}

pub fn replica(id: u64, oracle: SimOracle) -> Replica {
    Replica::new(
        ReplicaSpec {
            id: ReplicaId::new(id),
            host: format!("db-{id}.internal"),
            port: 5432,
            dbname: "bench".into(),
            user: "tuner".into(),
            password: String::new(),
        },
        Box::new(oracle),
        RetryPolicy::new(1, 0, 0),
    )
}
