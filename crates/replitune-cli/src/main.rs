//! replitune CLI: tune a replica fleet's index configurations and routing.

mod source;

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use replitune_cluster::cluster_workload;
use replitune_core::config::TunerConfig;
use replitune_oracle::GreedyAdvisor;
use replitune_tuner::Tuner;

use source::{build_replicas, load_roster, load_workload};

#[derive(Parser)]
#[command(name = "replitune")]
#[command(about = "Partition a SQL workload across read replicas and route queries by cost", long_about = None)]
struct Cli {
    /// Enable debug logging output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full tune → refine → route pipeline and emit a report
    Tune {
        /// Path to the replica roster YAML file
        #[arg(short, long, default_value = "./replicas.yaml")]
        replicas: PathBuf,

        /// Path to the query workload file (one statement per line)
        #[arg(short, long, default_value = "./queries.sql")]
        queries: PathBuf,

        /// Load-skew tolerance for routing, in [0, 1]
        #[arg(short, long)]
        tuning_parameter: Option<f64>,

        /// Per-replica index space budget in bytes
        #[arg(short = 'b', long)]
        space_budget: Option<u64>,

        /// Maximum width of a recommended index
        #[arg(short = 'w', long)]
        max_index_width: Option<usize>,

        /// Iteration cap for the tuning and refinement loops
        #[arg(long)]
        max_rounds: Option<usize>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the workload clusters that would seed tuning (EXPLAIN)
    Explain {
        /// Path to the replica roster YAML file
        #[arg(short, long, default_value = "./replicas.yaml")]
        replicas: PathBuf,

        /// Path to the query workload file
        #[arg(short, long, default_value = "./queries.sql")]
        queries: PathBuf,
    },

    /// Parse the roster and workload and report what was found
    Validate {
        /// Path to the replica roster YAML file
        #[arg(short, long, default_value = "./replicas.yaml")]
        replicas: PathBuf,

        /// Path to the query workload file
        #[arg(short, long, default_value = "./queries.sql")]
        queries: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Tune {
            replicas,
            queries,
            tuning_parameter,
            space_budget,
            max_index_width,
            max_rounds,
            output,
        } => run_tune(
            &replicas,
            &queries,
            tuning_parameter,
            space_budget,
            max_index_width,
            max_rounds,
            output,
        ),
        Commands::Explain { replicas, queries } => explain(&replicas, &queries),
        Commands::Validate { replicas, queries } => validate(&replicas, &queries),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[allow(clippy::too_many_arguments)]
fn run_tune(
    replicas_path: &PathBuf,
    queries_path: &PathBuf,
    tuning_parameter: Option<f64>,
    space_budget: Option<u64>,
    max_index_width: Option<usize>,
    max_rounds: Option<usize>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = TunerConfig::from_env();
    if let Some(t) = tuning_parameter {
        config.skew_threshold = t;
    }
    if let Some(budget) = space_budget {
        config.budget_bytes = budget;
    }
    if let Some(width) = max_index_width {
        config.max_index_width = width;
    }
    if let Some(rounds) = max_rounds {
        config.max_rounds = rounds;
    }
    config.validate()?;

    let roster = load_roster(replicas_path)?;
    let mut replicas = build_replicas(&roster, &config);

    // Column names come from the reference replica so extraction only
    // matches columns that actually exist.
    let columns = replicas[0].list_columns()?;
    let workload = load_workload(queries_path, &columns, config.max_index_width)?;

    let mut advisor = GreedyAdvisor::default();
    let report = Tuner::new(&workload, &mut replicas, &mut advisor, config)?.run()?;

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            fs::write(&path, json)?;
            println!("✓ Tuning run complete");
            println!("  Queries routed: {}", report.routes.len());
            println!("  Total cost: {:.2}", report.total_cost);
            println!("  Report: {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn explain(
    replicas_path: &PathBuf,
    queries_path: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let roster = load_roster(replicas_path)?;
    let config = TunerConfig::from_env();
    let mut replicas = build_replicas(&roster, &config);

    let columns = replicas[0].list_columns()?;
    let workload = load_workload(queries_path, &columns, config.max_index_width)?;
    let groups = cluster_workload(&workload, replicas.len())?;

    println!("Workload Clusters");
    println!("=================");
    println!();
    println!("Queries: {}", workload.len());
    println!("Replica slots: {}", replicas.len());
    println!();
    for (slot, group) in groups.iter().enumerate() {
        let replica = replicas[slot].spec();
        println!(
            "  {}. {}@{} - {} queries",
            slot,
            replica.dbname,
            replica.host,
            group.len()
        );
        for &pos in group {
            let query = &workload.queries()[pos];
            println!("     {}: {}", query.id(), truncate(query.text(), 60));
        }
    }

    Ok(())
}

fn validate(
    replicas_path: &PathBuf,
    queries_path: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let roster = load_roster(replicas_path)?;
    let config = TunerConfig::from_env();
    let mut replicas = build_replicas(&roster, &config);

    let columns = replicas[0].list_columns()?;
    let workload = load_workload(queries_path, &columns, config.max_index_width)?;

    println!("✓ Roster and workload are valid");
    println!("  Replicas: {}", replicas.len());
    println!("  Queries: {}", workload.len());
    println!("  Indexable columns: {}", workload.indexable_columns().len());

    Ok(())
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("select 1", 60), "select 1");
        assert_eq!(truncate("abcdef", 3), "abc");
    }
}
