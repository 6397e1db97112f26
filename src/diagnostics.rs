//! Diagnostics - vector statistics, index sanity probes, and score summaries
//!
//! Nothing here changes search behavior; it only reports on the data through
//! `tracing` so that broken encoder output is caught before a long run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use tracing::{info, warn};

use crate::error::Result;
use crate::index::{QueryEngine, SearchResults, VectorBatch, VectorView};

/// Number of passages used by the self-search probe
pub const PROBE_SIZE: usize = 100;

/// Summary statistics over a vector batch
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStats {
    pub rows: usize,
    pub dimensions: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f64,
    pub std: f64,
    pub norm_min: f32,
    pub norm_max: f32,
    pub norm_mean: f64,
    /// Values that are NaN or infinite
    pub non_finite: usize,
    /// Rows whose values are all zero
    pub zero_rows: usize,
}

impl VectorStats {
    pub fn compute(vectors: VectorView<'_>) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0f64;
        let mut sum_sq = 0f64;
        let mut non_finite = 0;
        let mut zero_rows = 0;
        let mut norm_min = f32::INFINITY;
        let mut norm_max = f32::NEG_INFINITY;
        let mut norm_sum = 0f64;

        for row in vectors.rows() {
            let mut row_sq = 0f32;
            let mut all_zero = true;
            for &v in row {
                if !v.is_finite() {
                    non_finite += 1;
                }
                if v != 0.0 {
                    all_zero = false;
                }
                min = min.min(v);
                max = max.max(v);
                sum += v as f64;
                sum_sq += (v as f64) * (v as f64);
                row_sq += v * v;
            }
            if all_zero {
                zero_rows += 1;
            }
            let norm = row_sq.sqrt();
            norm_min = norm_min.min(norm);
            norm_max = norm_max.max(norm);
            norm_sum += norm as f64;
        }

        let values = vectors.as_slice().len();
        let (mean, std) = if values > 0 {
            let mean = sum / values as f64;
            let var = (sum_sq / values as f64 - mean * mean).max(0.0);
            (mean, var.sqrt())
        } else {
            (0.0, 0.0)
        };
        let norm_mean = if vectors.is_empty() {
            0.0
        } else {
            norm_sum / vectors.len() as f64
        };

        Self {
            rows: vectors.len(),
            dimensions: vectors.dimensions(),
            min,
            max,
            mean,
            std,
            norm_min,
            norm_max,
            norm_mean,
            non_finite,
            zero_rows,
        }
    }
}

/// Log the shape and value distribution of a batch, warning on bad rows
pub fn log_vector_properties(name: &str, vectors: VectorView<'_>) -> VectorStats {
    let stats = VectorStats::compute(vectors);

    info!("Checking {} properties:", name);
    info!("Shape: ({}, {})", stats.rows, stats.dimensions);
    info!("Min: {:.6}, Max: {:.6}", stats.min, stats.max);
    info!("Mean: {:.6}, Std: {:.6}", stats.mean, stats.std);
    info!(
        "Norm min: {:.6}, max: {:.6}, mean: {:.6}",
        stats.norm_min, stats.norm_max, stats.norm_mean
    );

    if stats.non_finite > 0 {
        warn!("NaN or Inf values detected in {}", name);
    }
    if stats.zero_rows > 0 {
        warn!("{} zero vectors detected in {}", stats.zero_rows, name);
    }

    stats
}

/// Count ids that appear more than once, warning when any do
pub fn check_duplicate_ids(name: &str, ids: &[String]) -> usize {
    let mut seen = FxHashSet::default();
    let duplicates = ids.iter().filter(|id| !seen.insert(id.as_str())).count();
    if duplicates > 0 {
        warn!("{} duplicate ids detected in {}", duplicates, name);
    }
    duplicates
}

/// Min, max and mean over real (non-sentinel) scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStats {
    pub min: f32,
    pub max: f32,
    pub mean: f64,
    pub count: usize,
}

impl ScoreStats {
    pub fn from_results(results: &SearchResults) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0f64;
        let mut count = 0;

        for query in 0..results.num_queries() {
            for (score, _) in results.hits(query) {
                min = min.min(score);
                max = max.max(score);
                sum += score as f64;
                count += 1;
            }
        }

        Self {
            min,
            max,
            mean: if count > 0 { sum / count as f64 } else { 0.0 },
            count,
        }
    }
}

/// Queries whose every real score is exactly zero
pub fn zero_score_queries(results: &SearchResults) -> usize {
    (0..results.num_queries())
        .filter(|&q| {
            let mut hits = results.hits(q).peekable();
            hits.peek().is_some() && hits.all(|(score, _)| score == 0.0)
        })
        .count()
}

/// Outcome of [`sanity_check`]
#[derive(Debug, Clone, PartialEq)]
pub struct SanityReport {
    /// Fraction of probe passages whose top-1 hit is themselves
    pub exact_match_ratio: f64,
    pub self_scores: ScoreStats,
    pub random_scores: ScoreStats,
}

/// Search the first loaded passages for themselves, then random unit vectors.
///
/// `probe` must hold the passages with global indices `0..probe.len()`.
pub fn sanity_check(
    engine: &QueryEngine<'_>,
    probe: VectorView<'_>,
    seed: u64,
) -> Result<SanityReport> {
    info!("Testing index with {} sample vectors", probe.len());

    let results = engine.search(probe, 1)?;
    let matches = (0..results.num_queries())
        .filter(|&q| results.indices_row(q)[0] == q as i64)
        .count();
    let exact_match_ratio = if probe.is_empty() {
        0.0
    } else {
        matches as f64 / probe.len() as f64
    };
    let self_scores = ScoreStats::from_results(&results);

    info!("Exact match ratio in self-search: {:.2}%", exact_match_ratio * 100.0);
    info!(
        "Self-search score stats - min: {:.6}, max: {:.6}, mean: {:.6}",
        self_scores.min, self_scores.max, self_scores.mean
    );

    let random = random_unit_vectors(probe.len(), probe.dimensions(), seed)?;
    let results = engine.search(&random, 1)?;
    let random_scores = ScoreStats::from_results(&results);

    info!(
        "Random vector search score stats - min: {:.6}, max: {:.6}, mean: {:.6}",
        random_scores.min, random_scores.max, random_scores.mean
    );

    Ok(SanityReport {
        exact_match_ratio,
        self_scores,
        random_scores,
    })
}

/// `count` random vectors on the unit sphere
pub fn random_unit_vectors(count: usize, dimensions: usize, seed: u64) -> Result<VectorBatch> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(count * dimensions);

    for _ in 0..count {
        let mut row: Vec<f32> = (0..dimensions).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt().max(f32::MIN_POSITIVE);
        for v in &mut row {
            *v /= norm;
        }
        data.extend(row);
    }

    VectorBatch::new(dimensions, data)
}
