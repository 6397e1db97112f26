//! JSON Lines storage - one `{"id": ..., "vector": [...]}` object per line

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::index::VectorBatch;

use super::Reps;

/// External ids may arrive as strings or bare numbers; both are kept as text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecordIn {
    id: RawId,
    vector: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct RecordOut<'a> {
    id: &'a str,
    vector: &'a [f32],
}

/// Load every record; the first one fixes the vector width
pub fn load(path: &Path) -> anyhow::Result<Reps> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);

    let mut vectors: Option<VectorBatch> = None;
    let mut ids = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: RecordIn = serde_json::from_str(&line)
            .with_context(|| format!("{:?} line {}: malformed record", path, line_no + 1))?;

        match vectors.as_mut() {
            Some(batch) => batch
                .push(&record.vector)
                .with_context(|| format!("{:?} line {}", path, line_no + 1))?,
            None => {
                let width = record.vector.len();
                vectors = Some(
                    VectorBatch::new(width, record.vector)
                        .with_context(|| format!("{:?} line {}", path, line_no + 1))?,
                );
            }
        }
        ids.push(record.id.into_string());
    }

    let vectors = match vectors {
        Some(v) => v,
        None => anyhow::bail!("{:?} contains no vectors", path),
    };

    Reps::new(vectors, ids)
}

/// Write every record as one JSON line
pub fn save(reps: &Reps, path: &Path) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    for (id, vector) in reps.ids.iter().zip(reps.vectors.rows()) {
        let json = serde_json::to_string(&RecordOut { id, vector })?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(())
}
