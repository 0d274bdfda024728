//! Labeled training data: loading, featurizing and splitting.

use crate::chem::{Composition, ElementPropertyFeaturizer};
use crate::pipeline::dataset::SUBSTANCE_COLUMN;
use crate::pipeline::Table;
use anyhow::{ensure, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;
use tracing::{info, warn};

pub const LABEL_COLUMN: &str = "label";

/// Featurized rows with 0/1 targets.
#[derive(Debug, Clone, Default)]
pub struct LabeledData {
    pub substances: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
    /// Rows skipped because the formula or label did not parse.
    pub dropped: usize,
}

impl LabeledData {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Rows at the given indices, as (features, labels).
    pub fn select(&self, indices: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>) {
        indices
            .iter()
            .map(|&i| (self.features[i].clone(), self.labels[i]))
            .unzip()
    }
}

/// Parse a binary label: `0`, `1`, `0.0`, `1.0`, `true`, `false`.
pub fn parse_label(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Some(1.0),
        "false" => return Some(0.0),
        _ => {}
    }
    match raw.parse::<f64>() {
        Ok(v) if v == 0.0 || v == 1.0 => Some(v),
        _ => None,
    }
}

/// Read a CSV with `Substance` and `label` columns and featurize every row.
pub fn load_labeled_csv(path: &Path, featurizer: &ElementPropertyFeaturizer) -> Result<LabeledData> {
    let table = Table::read_csv(path)
        .with_context(|| format!("Failed to read training data {}", path.display()))?;
    let substance_idx = table.require_column(SUBSTANCE_COLUMN)?;
    let label_idx = table.require_column(LABEL_COLUMN)?;

    let mut data = LabeledData::default();
    for (line, row) in table.rows.iter().enumerate() {
        let substance = row.get(substance_idx).map(String::as_str).unwrap_or("");
        let raw_label = row.get(label_idx).map(String::as_str).unwrap_or("");

        let Some(composition) = Composition::parse(substance) else {
            warn!("Row {}: cannot parse composition '{}', skipping", line + 1, substance);
            data.dropped += 1;
            continue;
        };
        let Some(label) = parse_label(raw_label) else {
            warn!("Row {}: invalid label '{}', skipping", line + 1, raw_label);
            data.dropped += 1;
            continue;
        };

        data.substances.push(substance.to_string());
        data.features.push(featurizer.featurize(&composition));
        data.labels.push(label);
    }

    info!(
        "Loaded {} training rows from {} ({} dropped)",
        data.len(),
        path.display(),
        data.dropped
    );
    Ok(data)
}

/// Row indices of a shuffled train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded RNG and hold out `ceil(n * test_size)` rows,
/// always leaving at least one row for training.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<Split> {
    ensure!(n > 0, "no usable training rows");
    ensure!(
        (0.0..1.0).contains(&test_size),
        "test_size must be in [0, 1), got {}",
        test_size
    );

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64 * test_size).ceil() as usize).min(n - 1);
    let train = indices.split_off(n_test);
    Ok(Split {
        train,
        test: indices,
    })
}
