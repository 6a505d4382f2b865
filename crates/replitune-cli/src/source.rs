//! Roster and workload ingestion.
//!
//! The roster is a YAML file naming the replicas and (for simulated runs)
//! the schema whose columns seed the oracle. The workload is a flat text
//! file, one SQL statement per line; indexable columns are extracted by
//! matching known column names inside WHERE clauses, case-insensitively.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use replitune_core::config::TunerConfig;
use replitune_core::id::QueryId;
use replitune_core::schema::{Column, Table};
use replitune_core::workload::{Query, Workload};
use replitune_oracle::{Replica, ReplicaSpec, RetryPolicy, SimOracle};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed roster {path}: {source}")]
    Roster {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("roster {0} names no replicas")]
    EmptyRoster(String),

    #[error(transparent)]
    Workload(#[from] replitune_core::Error),
}

#[derive(Debug, Deserialize)]
pub struct RosterFile {
    pub replicas: Vec<ReplicaSpec>,
    #[serde(default)]
    pub schema: SchemaFile,
}

#[derive(Debug, Default, Deserialize)]
pub struct SchemaFile {
    pub tables: Vec<TableSpec>,
}

#[derive(Debug, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<String>,
}

impl SchemaFile {
    pub fn columns(&self) -> Vec<Column> {
        self.tables
            .iter()
            .flat_map(|spec| {
                let mut table = Table::new(&spec.name);
                table.add_columns(&spec.columns);
                table.columns().to_vec()
            })
            .collect()
    }
}

pub fn load_roster(path: &Path) -> Result<RosterFile, SourceError> {
    let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let roster: RosterFile = serde_yaml::from_str(&text).map_err(|source| SourceError::Roster {
        path: path.display().to_string(),
        source,
    })?;
    if roster.replicas.is_empty() {
        return Err(SourceError::EmptyRoster(path.display().to_string()));
    }
    Ok(roster)
}

/// One simulated replica per roster entry. A live deployment swaps the
/// `SimOracle` for a what-if database connector behind the same trait.
pub fn build_replicas(roster: &RosterFile, config: &TunerConfig) -> Vec<Replica> {
    let columns = roster.schema.columns();
    let retry = RetryPolicy::new(
        config.retry_max_attempts,
        config.retry_initial_backoff_ms,
        config.retry_max_backoff_ms,
    );

    roster
        .replicas
        .iter()
        .map(|spec| {
            Replica::new(
                spec.clone(),
                Box::new(SimOracle::new(columns.clone())),
                retry,
            )
        })
        .collect()
}

static PREDICATE_RE: Lazy<Regex> = Lazy::new(|| {
    // WHERE clause up to a closing paren, GROUP BY / ORDER BY, or the end
    // of the statement.
    Regex::new(r"(?i)\bwhere\b(.+?)(?:\)|\bgroup\s+by\b|\border\s+by\b|;|$)")
        .expect("predicate regex is valid")
});

/// Columns referenced by a statement, matched by name against the
/// replica's known columns inside its WHERE clauses.
pub fn extract_columns(text: &str, known: &[Column]) -> Vec<Column> {
    let mut found: Vec<Column> = Vec::new();
    for captures in PREDICATE_RE.captures_iter(text) {
        let predicate = captures[1].to_lowercase();
        for column in known {
            if predicate.contains(column.name()) && !found.contains(column) {
                found.push(column.clone());
            }
        }
    }
    found
}

/// Reads a workload file: one statement per line, blank lines and `--`
/// comments skipped, ids assigned in file order.
pub fn load_workload(
    path: &Path,
    known: &[Column],
    candidate_width: usize,
) -> Result<Workload, SourceError> {
    let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_workload(&text, known, candidate_width)?)
}

pub fn parse_workload(
    text: &str,
    known: &[Column],
    candidate_width: usize,
) -> Result<Workload, replitune_core::Error> {
    let queries = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("--"))
        .enumerate()
        .map(|(pos, line)| {
            let columns = extract_columns(line, known);
            Query::new(QueryId::new(pos as u64), line, columns, candidate_width)
        })
        .collect();
    Workload::new(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<Column> {
        let mut t = Table::new("lineitem");
        t.add_columns(["l_shipdate", "l_orderkey", "l_quantity"]);
        t.columns().to_vec()
    }

    #[test]
    fn extracts_known_columns_from_where_clauses() {
        let cols = extract_columns(
            "SELECT * FROM lineitem WHERE l_shipdate > '1994-01-01' AND l_quantity < 24;",
            &known(),
        );
        let names: Vec<_> = cols.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["l_shipdate", "l_quantity"]);
    }

    #[test]
    fn matching_is_case_insensitive_and_ignores_non_predicate_text() {
        let cols = extract_columns("SELECT l_orderkey FROM lineitem", &known());
        assert!(cols.is_empty());

        let cols = extract_columns(
            "select * from lineitem WHERE L_ORDERKEY = 42 order by l_quantity",
            &known(),
        );
        let names: Vec<_> = cols.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["l_orderkey"]);
    }

    #[test]
    fn workload_parsing_skips_blanks_and_comments() {
        let text = "\n-- warmup trace\nSELECT * FROM lineitem WHERE l_quantity > 1;\n\nSELECT * FROM lineitem WHERE l_orderkey = 7;\n";
        let workload = parse_workload(text, &known(), 2).unwrap();
        assert_eq!(workload.len(), 2);
        assert_eq!(workload.queries()[0].id(), QueryId::new(0));
        assert_eq!(workload.queries()[1].id(), QueryId::new(1));
        assert_eq!(workload.queries()[0].columns().len(), 1);
    }

    #[test]
    fn roster_yaml_parses_replicas_and_schema() {
        let yaml = r#"
replicas:
  - id: 0
    host: db-0.internal
    port: 5432
    dbname: tpch
    user: tuner
  - id: 1
    host: db-1.internal
    port: 5432
    dbname: tpch
    user: tuner
    password: hunter2
schema:
  tables:
    - name: lineitem
      columns: [l_shipdate, l_orderkey]
"#;
        let roster: RosterFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(roster.replicas.len(), 2);
        assert_eq!(roster.replicas[0].password, "");
        assert_eq!(roster.replicas[1].password, "hunter2");
        assert_eq!(roster.schema.columns().len(), 2);

        let replicas = build_replicas(&roster, &TunerConfig::default());
        assert_eq!(replicas.len(), 2);
    }
}
