//! Search command - shard passages across devices and rank encoded queries

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use shardex::config::Config;
use shardex::diagnostics::{self, ScoreStats, PROBE_SIZE};
use shardex::ranking;
use shardex::{BackendType, QueryEngine, Reps, ShardManager, VectorBatch};

#[derive(Args)]
pub struct SearchArgs {
    /// Encoded queries (bundle or .jsonl)
    #[arg(long)]
    pub query_reps: PathBuf,

    /// Encoded passage files or quoted glob patterns (e.g. 'corpus*.jsonl').
    /// Files load in the order given; each pattern's matches load sorted.
    #[arg(long, required = true, num_args = 1..)]
    pub passage_reps: Vec<PathBuf>,

    /// Where to write the ranking
    #[arg(long)]
    pub save_ranking_to: PathBuf,

    /// Number of results per query (default: config search.depth)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Queries searched per batch (default: config search.batch_size)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Number of devices (default: config shards.num_devices)
    #[arg(long)]
    pub num_devices: Option<usize>,

    /// Maximum vectors per device (default: config shards.capacity_per_device)
    #[arg(long)]
    pub capacity_per_device: Option<usize>,

    /// Device-local backend
    #[arg(long, value_parser = ["flat", "parallel-flat"])]
    pub backend: Option<String>,

    /// Write a tab-separated `qid docid score` ranking instead of JSON
    #[arg(long)]
    pub save_text: bool,

    /// Run self-search and random-vector probes before searching
    #[arg(long)]
    pub sanity_check: bool,

    /// Seed for the random-vector probe
    #[arg(long, default_value = "0")]
    pub seed: u64,
}

/// Resolved search settings: CLI flags over config file over defaults
#[derive(Debug, Clone)]
struct SearchPlan {
    depth: usize,
    batch_size: usize,
    num_devices: usize,
    capacity_per_device: usize,
    backend: BackendType,
}

impl SearchPlan {
    fn resolve(args: &SearchArgs, config: &Config) -> anyhow::Result<Self> {
        let backend = match &args.backend {
            Some(name) => name.parse()?,
            None => config.shards.backend,
        };

        Ok(Self {
            depth: args.depth.unwrap_or(config.search.depth),
            batch_size: args.batch_size.unwrap_or(config.search.batch_size),
            num_devices: args.num_devices.unwrap_or(config.shards.num_devices),
            capacity_per_device: args
                .capacity_per_device
                .unwrap_or(config.shards.capacity_per_device),
            backend,
        })
    }
}

pub async fn run(args: SearchArgs, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load();
    let plan = SearchPlan::resolve(&args, &config)?;

    // Loading and scanning are CPU-bound; keep them off the async workers
    tokio::task::spawn_blocking(move || search_blocking(args, plan, quiet)).await?
}

fn search_blocking(args: SearchArgs, plan: SearchPlan, quiet: bool) -> anyhow::Result<()> {
    info!(
        "Searching with {} {} devices x {} vectors, depth {}",
        plan.num_devices, plan.backend, plan.capacity_per_device, plan.depth
    );

    // Load passages, placing each file as it arrives
    let mut shards: Option<ShardManager> = None;
    let mut look_up: Vec<String> = Vec::new();
    let mut probe: Option<VectorBatch> = None;

    let passage_files = expand_patterns(&args.passage_reps)?;
    info!("Found {} passage files", passage_files.len());

    for path in &passage_files {
        let reps = Reps::load(path)?;
        diagnostics::log_vector_properties(
            &format!("Passage vectors from {}", path.display()),
            reps.vectors.view(),
        );

        if shards.is_none() {
            shards = Some(ShardManager::new(
                reps.dimensions(),
                plan.num_devices,
                plan.capacity_per_device,
                plan.backend,
            )?);
        }
        if let Some(shards) = shards.as_mut() {
            shards
                .add(&reps.vectors)
                .with_context(|| format!("Failed to add passages from {}", path.display()))?;
        }

        if probe.is_none() {
            probe = Some(VectorBatch::empty(reps.dimensions())?);
        }
        if let Some(probe) = probe.as_mut() {
            let wanted = PROBE_SIZE.saturating_sub(probe.len()).min(reps.vectors.len());
            if wanted > 0 {
                probe.extend(reps.vectors.view().slice(0..wanted))?;
            }
        }

        look_up.extend(reps.ids);
    }

    let shards = shards.context("No passage files given")?;
    diagnostics::check_duplicate_ids("passage lookup", &look_up);
    info!(
        "Loaded {} passages; vectors per device: {:?}",
        shards.len(),
        shards.device_occupancy()
    );

    // Load queries
    let queries = Reps::load(&args.query_reps)?;
    diagnostics::log_vector_properties("Query vectors", queries.vectors.view());

    let engine = QueryEngine::new(&shards).with_progress(!quiet);

    if args.sanity_check {
        if let Some(probe) = &probe {
            diagnostics::sanity_check(&engine, probe.view(), args.seed)?;
        }
    }

    info!(
        "Searching {} queries for top {} results",
        queries.len(),
        plan.depth
    );
    let results = engine.batch_search(&queries.vectors, plan.depth, plan.batch_size)?;

    let stats = ScoreStats::from_results(&results);
    info!(
        "Score stats - min: {:.6}, max: {:.6}, mean: {:.6}",
        stats.min, stats.max, stats.mean
    );

    // Additional diagnostics
    let zero_queries = diagnostics::zero_score_queries(&results);
    if zero_queries > 0 {
        warn!("{} queries returned all zero scores", zero_queries);
    }
    if plan.depth > shards.len() {
        warn!(
            "Depth {} exceeds the {} indexed passages; trailing slots are empty",
            plan.depth,
            shards.len()
        );
    }

    if args.save_text {
        let rankings = ranking::translate_ranking(&results, &look_up)?;
        ranking::write_text(&args.save_ranking_to, &queries.ids, &rankings)?;
    } else {
        ranking::write_json(&args.save_ranking_to, &queries.ids, &results, &look_up)?;
    }

    info!("Results saved to {}", args.save_ranking_to.display());
    Ok(())
}

/// Expand glob patterns, keeping plain paths as given
fn expand_patterns(patterns: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        if !is_pattern(pattern) {
            files.push(pattern.clone());
            continue;
        }

        let text = pattern.to_string_lossy();
        let mut matches = glob::glob(&text)
            .with_context(|| format!("Invalid passage pattern {}", text))?
            .collect::<Result<Vec<PathBuf>, glob::GlobError>>()?;
        if matches.is_empty() {
            anyhow::bail!("No passage files match {}", text);
        }
        matches.sort();
        files.extend(matches);
    }

    Ok(files)
}

fn is_pattern(path: &Path) -> bool {
    path.to_string_lossy()
        .chars()
        .any(|c| matches!(c, '*' | '?' | '['))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &std::path::Path) -> SearchArgs {
        SearchArgs {
            query_reps: dir.join("q.jsonl"),
            passage_reps: vec![dir.join("p0.jsonl"), dir.join("p1.jsonl")],
            save_ranking_to: dir.join("run.tsv"),
            depth: Some(2),
            batch_size: Some(1),
            num_devices: Some(2),
            capacity_per_device: Some(2),
            backend: None,
            save_text: true,
            sanity_check: true,
            seed: 3,
        }
    }

    #[test]
    fn test_plan_prefers_flags_over_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(dir.path());
        a.backend = Some("parallel-flat".to_string());
        a.batch_size = None;

        let plan = SearchPlan::resolve(&a, &Config::default()).unwrap();
        assert_eq!(plan.backend, BackendType::ParallelFlat);
        assert_eq!(plan.depth, 2);
        assert_eq!(plan.batch_size, 128);
    }

    fn write_fixtures(dir: &Path) {
        std::fs::write(
            dir.join("p0.jsonl"),
            "{\"id\": \"d0\", \"vector\": [1.0, 0.0]}\n{\"id\": \"d1\", \"vector\": [0.0, 1.0]}\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("p1.jsonl"),
            "{\"id\": \"d2\", \"vector\": [0.7, 0.7]}\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("q.jsonl"),
            "{\"id\": \"q0\", \"vector\": [0.0, 2.0]}\n{\"id\": \"q1\", \"vector\": [1.0, 0.1]}\n",
        )
        .unwrap();
    }

    fn assert_fixture_ranking(dir: &Path) {
        let content = std::fs::read_to_string(dir.join("run.tsv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("q0\td1\t"));
        assert!(lines[1].starts_with("q0\td2\t"));
        assert!(lines[2].starts_with("q1\td0\t"));
    }

    #[test]
    fn test_search_across_files_writes_ranking() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let a = args(dir.path());
        let plan = SearchPlan::resolve(&a, &Config::default()).unwrap();
        search_blocking(a, plan, true).unwrap();

        assert_fixture_ranking(dir.path());
    }

    #[test]
    fn test_search_with_passage_pattern() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let mut a = args(dir.path());
        a.passage_reps = vec![dir.path().join("p*.jsonl")];
        let plan = SearchPlan::resolve(&a, &Config::default()).unwrap();
        search_blocking(a, plan, true).unwrap();

        assert_fixture_ranking(dir.path());
    }

    #[test]
    fn test_expand_patterns_sorts_matches_and_keeps_plain_paths() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let files = expand_patterns(&[
            dir.path().join("q.jsonl"),
            dir.path().join("p?.jsonl"),
        ])
        .unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("q.jsonl"),
                dir.path().join("p0.jsonl"),
                dir.path().join("p1.jsonl"),
            ]
        );
    }

    #[test]
    fn test_expand_patterns_without_match_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = expand_patterns(&[dir.path().join("corpus*.jsonl")]).unwrap_err();
        assert!(err.to_string().contains("No passage files match"));
    }

    #[test]
    fn test_over_capacity_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("p0.jsonl"),
            "{\"id\": \"d0\", \"vector\": [1.0]}\n{\"id\": \"d1\", \"vector\": [2.0]}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("p1.jsonl"),
            "{\"id\": \"d2\", \"vector\": [3.0]}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("q.jsonl"), "{\"id\": \"q0\", \"vector\": [1.0]}\n").unwrap();

        let mut a = args(dir.path());
        a.num_devices = Some(1);
        let plan = SearchPlan::resolve(&a, &Config::default()).unwrap();

        let err = format!("{:#}", search_blocking(a, plan, true).unwrap_err());
        assert!(err.contains("capacity exceeded"));
    }
}
