//! End-to-end tests for the tune → refine → route pipeline.

mod util;

use replitune_core::config::TunerConfig;
use replitune_core::id::{QueryId, ReplicaId};
use replitune_oracle::{GreedyAdvisor, SimOracle};
use replitune_tuner::{
    baseline_costs, cluster_and_tune, refine, Partition, TunedState, Tuner, TunerError,
};

use util::{col, index, query, replica, workload};

fn test_config() -> TunerConfig {
    TunerConfig {
        budget_bytes: 1_000,
        max_index_width: 2,
        skew_threshold: 0.5,
        max_rounds: 16,
        retry_max_attempts: 1,
        retry_initial_backoff_ms: 0,
        retry_max_backoff_ms: 0,
    }
}

fn advisor() -> GreedyAdvisor {
    GreedyAdvisor {
        bytes_per_column: 100,
    }
}

/// Two column families, one replica each: a-queries land on one replica
/// with an `a` index, b-queries on the other with a `b` index.
fn family_oracle() -> SimOracle {
    let mut oracle = SimOracle::new(vec![col("a"), col("b")])
        .with_default_speedup(1.0)
        .with_speedup(index(&["a"]), 0.2)
        .with_speedup(index(&["b"]), 0.2);
    for id in 0..4 {
        oracle = oracle.with_base_cost(QueryId::new(id), 100.0);
    }
    oracle
}

fn family_workload() -> replitune_core::workload::Workload {
    workload(vec![
        query(0, &["a"]),
        query(1, &["a"]),
        query(2, &["b"]),
        query(3, &["b"]),
    ])
}

#[test]
fn stage1_separates_column_families_and_converges() {
    let w = family_workload();
    let mut replicas = vec![replica(0, family_oracle()), replica(1, family_oracle())];
    let mut advisor = advisor();

    let tuned = cluster_and_tune(&w, &mut replicas, &mut advisor, &test_config()).unwrap();

    // Each family is served by its own index at a fifth of base cost.
    assert_eq!(tuned.total_cost, 80.0);
    assert_eq!(tuned.configurations[0], vec![index(&["a"])]);
    assert_eq!(tuned.configurations[1], vec![index(&["b"])]);
    assert_eq!(
        tuned.partition.group(0),
        &[QueryId::new(0), QueryId::new(1)]
    );
    assert_eq!(
        tuned.partition.group(1),
        &[QueryId::new(2), QueryId::new(3)]
    );
}

#[test]
fn stage2_never_returns_a_costlier_state() {
    let w = family_workload();
    let mut replicas = vec![replica(0, family_oracle()), replica(1, family_oracle())];
    let mut advisor = advisor();
    let config = test_config();

    let tuned = cluster_and_tune(&w, &mut replicas, &mut advisor, &config).unwrap();
    let start_cost = tuned.total_cost;

    let baseline = baseline_costs(&mut replicas[0], &w).unwrap();
    let refined = refine(&w, &mut replicas, &mut advisor, &config, &baseline, tuned).unwrap();

    assert!(refined.total_cost <= start_cost);
}

#[test]
fn refinement_with_no_beneficial_destination_changes_nothing() {
    // A single query, and a second replica that is worse than running the
    // query unindexed: refinement must terminate without touching the
    // partition.
    let w = workload(vec![query(1, &["a"])]);
    let r0 = SimOracle::new(vec![col("a")])
        .with_default_speedup(1.0)
        .with_base_cost(QueryId::new(1), 100.0);
    let r1 = SimOracle::new(vec![col("a")])
        .with_default_speedup(1.0)
        .with_base_cost(QueryId::new(1), 120.0);
    let mut replicas = vec![replica(0, r0), replica(1, r1)];
    let mut advisor = advisor();
    let config = test_config();

    let start = TunedState {
        configurations: vec![Vec::new(), Vec::new()],
        partition: Partition::from_groups(vec![vec![QueryId::new(1)], Vec::new()]),
        total_cost: 100.0,
    };

    let baseline = baseline_costs(&mut replicas[0], &w).unwrap();
    assert_eq!(baseline, vec![100.0]);

    let refined = refine(
        &w,
        &mut replicas,
        &mut advisor,
        &config,
        &baseline,
        start.clone(),
    )
    .unwrap();

    assert_eq!(refined.partition, start.partition);
    assert_eq!(refined.total_cost, 100.0);
}

#[test]
fn full_run_covers_every_query_exactly_once_with_valid_replicas() {
    let w = family_workload();
    let mut replicas = vec![replica(0, family_oracle()), replica(1, family_oracle())];
    let mut advisor = advisor();

    let report = Tuner::new(&w, &mut replicas, &mut advisor, test_config())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.routes.len(), w.len());
    let valid = [ReplicaId::new(0), ReplicaId::new(1)];
    for query in w.iter() {
        let route = report.routes.get(query.id()).expect("query is routed");
        assert!(valid.contains(&route));
    }
    assert_eq!(report.configurations.len(), 2);
    assert!(report.started_ms <= report.finished_ms);
}

#[test]
fn full_run_is_deterministic_for_identical_inputs() {
    let run = || {
        let w = family_workload();
        let mut replicas = vec![replica(0, family_oracle()), replica(1, family_oracle())];
        let mut advisor = advisor();
        Tuner::new(&w, &mut replicas, &mut advisor, test_config())
            .unwrap()
            .run()
            .unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.routes, second.routes);
    assert_eq!(first.configurations, second.configurations);
    assert_eq!(first.total_cost, second.total_cost);
    assert_eq!(first.workload_hash, second.workload_hash);
    assert_eq!(first.roster_hash, second.roster_hash);
}

#[test]
fn mixed_workload_pipeline_holds_its_invariants() {
    // Unpinned text-derived costs, three replicas, overlapping column
    // sets: the exact outcome is not asserted, the invariants are.
    let w = workload(vec![
        query(0, &["a", "b"]),
        query(1, &["a"]),
        query(2, &["b", "c"]),
        query(3, &["c"]),
        query(4, &["a", "c"]),
        query(5, &[]),
    ]);
    let schema = vec![col("a"), col("b"), col("c")];
    let mut replicas = vec![
        replica(0, SimOracle::new(schema.clone())),
        replica(1, SimOracle::new(schema.clone())),
        replica(2, SimOracle::new(schema)),
    ];
    let mut advisor = advisor();
    let config = test_config();

    let tuned = cluster_and_tune(&w, &mut replicas, &mut advisor, &config).unwrap();
    let baseline = baseline_costs(&mut replicas[0], &w).unwrap();
    let refined = refine(
        &w,
        &mut replicas,
        &mut advisor,
        &config,
        &baseline,
        tuned.clone(),
    )
    .unwrap();
    assert!(refined.total_cost <= tuned.total_cost);

    let routes = replitune_tuner::load_aware_route(
        &w,
        &mut replicas,
        &refined.configurations,
        &baseline,
        config.skew_threshold,
    )
    .unwrap();
    assert_eq!(routes.len(), w.len());
}

#[test]
fn construction_rejects_degenerate_inputs() {
    let w = family_workload();
    let empty = workload(Vec::new());
    let mut advisor = advisor();

    let mut no_replicas: Vec<replitune_oracle::Replica> = Vec::new();
    assert!(matches!(
        Tuner::new(&w, &mut no_replicas, &mut advisor, test_config()),
        Err(TunerError::NoReplicas)
    ));

    let mut replicas = vec![replica(0, family_oracle())];
    assert!(matches!(
        Tuner::new(&empty, &mut replicas, &mut advisor, test_config()),
        Err(TunerError::EmptyWorkload)
    ));

    let mut bad = test_config();
    bad.skew_threshold = 2.0;
    assert!(Tuner::new(&w, &mut replicas, &mut advisor, bad).is_err());
}
