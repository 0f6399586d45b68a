//! Cluster a dataset read from JSON and print the response.
//!
//! ```text
//! cargo run --example cluster_dataset -- dataset.json org/repo 5 auto
//! ```
//!
//! The dataset file holds `dataset_id`, `repositories`, `metrics` and
//! `values`. Without arguments a small built-in dataset is used. Set
//! `REPOSIM_CONFIG` to a TOML file to override the engine defaults, and
//! `RUST_LOG=reposim=debug` to see each pipeline step.

use reposim::{
    BasicCounters, ClusterRequest, EngineConfig, InMemoryMetricStore, MetricDefinition, MetricValue,
    RepositoryRecord, SimilarityEngine,
};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
struct Dataset {
    #[serde(default)]
    dataset_id: String,
    repositories: Vec<RepositoryRecord>,
    #[serde(flatten)]
    store: InMemoryMetricStore,
}

fn builtin() -> Dataset {
    let profiles: [(&str, u64, u64, u64, f64); 8] = [
        ("acme/parser", 1200, 150, 40, 82.0),
        ("acme/lexer", 1100, 130, 35, 79.0),
        ("acme/codegen", 900, 100, 30, 75.0),
        ("tiny/cli", 15, 2, 1, 20.0),
        ("tiny/utils", 30, 5, 2, 35.0),
        ("big/framework", 45000, 9000, 900, 64.0),
        ("big/runtime", 38000, 7000, 750, 70.0),
        ("solo/notes", 3, 0, 1, 0.0),
    ];

    let mut store = InMemoryMetricStore::new()
        .with_metric(MetricDefinition::new("cov", "Test Coverage"));
    let mut repositories = Vec::new();
    for (i, (name, stars, forks, contributors, coverage)) in profiles.into_iter().enumerate() {
        let id = format!("r{i}");
        store = store.with_value(MetricValue::new(id.clone(), "cov", coverage));
        repositories.push(RepositoryRecord::new(id, name).with_counters(BasicCounters {
            stars,
            forks,
            contributors,
            commits: contributors * 40,
            open_issues: stars / 50,
            loc: 2000 + stars * 3,
        }));
    }

    Dataset {
        dataset_id: "builtin".into(),
        repositories,
        store,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let dataset = match args.first() {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => builtin(),
    };
    let selected = match args.get(1) {
        Some(name) => name.clone(),
        None => dataset
            .repositories
            .first()
            .map(|r| r.name.clone())
            .ok_or("dataset has no repositories")?,
    };
    let n: usize = args.get(2).map(|s| s.parse::<usize>()).transpose()?.unwrap_or(3);
    let algorithm = args.get(3).cloned().unwrap_or_else(|| "auto".into());

    let config = match std::env::var("REPOSIM_CONFIG") {
        Ok(path) => EngineConfig::from_file(path)?,
        Err(_) => EngineConfig::default(),
    }
    .with_env_overrides();
    config.validate()?;

    let request = ClusterRequest::new(dataset.dataset_id.clone(), selected, n).with_algorithm(algorithm);
    if let Err(e) = request.validate(dataset.repositories.len()) {
        eprintln!("warning: {e}");
    }

    let result = SimilarityEngine::with_config(config).cluster(&dataset.repositories, &dataset.store, &request)?;
    println!("{}", result.to_json_pretty()?);
    Ok(())
}
