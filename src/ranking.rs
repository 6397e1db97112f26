//! Ranked output - translate global indices to external ids and write rankings
//!
//! Text rankings hold one `qid \t docid \t score` line per (query, doc) pair,
//! grouped by query and sorted by descending score. JSON rankings keep the
//! raw `(num_queries, k)` layout, with `null` in sentinel slots.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::index::SearchResults;

/// One query's ranked (doc id, score) list
pub type Ranking = Vec<(String, f32)>;

/// Map every real match through the passage lookup. Sentinel slots are dropped.
pub fn translate_ranking(
    results: &SearchResults,
    passage_ids: &[String],
) -> anyhow::Result<Vec<Ranking>> {
    (0..results.num_queries())
        .map(|q| {
            results
                .hits(q)
                .map(|(score, idx)| match passage_ids.get(idx) {
                    Some(id) => Ok((id.clone(), score)),
                    None => anyhow::bail!(
                        "Global index {} is outside the passage lookup ({} ids)",
                        idx,
                        passage_ids.len()
                    ),
                })
                .collect::<anyhow::Result<Ranking>>()
        })
        .collect()
}

/// Write a tab-separated ranking
pub fn write_text(path: &Path, query_ids: &[String], rankings: &[Ranking]) -> anyhow::Result<()> {
    if query_ids.len() != rankings.len() {
        anyhow::bail!(
            "{} query ids for {} rankings",
            query_ids.len(),
            rankings.len()
        );
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let mut lines = 0usize;

    for (qid, ranking) in query_ids.iter().zip(rankings) {
        let mut sorted: Vec<&(String, f32)> = ranking.iter().collect();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (doc_id, score) in sorted {
            writeln!(writer, "{}\t{}\t{}", qid, doc_id, score)?;
            lines += 1;
        }
    }

    writer.flush()?;
    info!("Wrote {} ranking lines to {}", lines, path.display());
    Ok(())
}

#[derive(Serialize)]
struct JsonRanking<'a> {
    query_ids: &'a [String],
    k: usize,
    scores: Vec<Vec<Option<f32>>>,
    ids: Vec<Vec<Option<&'a str>>>,
}

/// Write the full `(num_queries, k)` score and id matrices as JSON
pub fn write_json(
    path: &Path,
    query_ids: &[String],
    results: &SearchResults,
    passage_ids: &[String],
) -> anyhow::Result<()> {
    if query_ids.len() != results.num_queries() {
        anyhow::bail!(
            "{} query ids for {} result rows",
            query_ids.len(),
            results.num_queries()
        );
    }

    let mut scores = Vec::with_capacity(results.num_queries());
    let mut ids = Vec::with_capacity(results.num_queries());

    for (score_row, index_row) in results.rows() {
        let mut row_scores = Vec::with_capacity(results.k());
        let mut row_ids = Vec::with_capacity(results.k());
        for (&score, &idx) in score_row.iter().zip(index_row) {
            if idx < 0 {
                row_scores.push(None);
                row_ids.push(None);
                continue;
            }
            let id = passage_ids.get(idx as usize).ok_or_else(|| {
                anyhow::anyhow!(
                    "Global index {} is outside the passage lookup ({} ids)",
                    idx,
                    passage_ids.len()
                )
            })?;
            row_scores.push(Some(score));
            row_ids.push(Some(id.as_str()));
        }
        scores.push(row_scores);
        ids.push(row_ids);
    }

    let payload = JsonRanking {
        query_ids,
        k: results.k(),
        scores,
        ids,
    };

    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &payload)?;
    info!("Wrote {} ranked queries to {}", query_ids.len(), path.display());
    Ok(())
}
