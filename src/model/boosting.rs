//! Gradient-boosted tree classifier with log-loss.
//!
//! The model is persisted as a single JSON document holding the feature
//! names it was trained on, so prediction can refuse a mismatched matrix.

use crate::model::tree::{BinnedMatrix, RegressionTree, TreeParams};
use anyhow::{bail, ensure, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};

const FORMAT_VERSION: u32 = 1;
const PROB_EPS: f64 = 1e-6;

/// Hyperparameters for boosting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub iterations: usize,
    pub learning_rate: f64,
    pub depth: usize,
    pub loss_function: String,
    pub l2_leaf_reg: f64,
    pub min_samples_leaf: usize,
    pub max_bins: usize,
    /// Log training loss every `verbose` iterations; 0 disables.
    pub verbose: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            iterations: 1000,
            learning_rate: 0.05,
            depth: 6,
            loss_function: "Logloss".into(),
            l2_leaf_reg: 3.0,
            min_samples_leaf: 1,
            max_bins: 32,
            verbose: 100,
        }
    }
}

/// A fitted binary classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    format_version: u32,
    feature_names: Vec<String>,
    base_score: f64,
    learning_rate: f64,
    params: BoostingParams,
    trained_at: DateTime<Utc>,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedClassifier {
    /// Fit on a row-major matrix with 0/1 labels.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        feature_names: Vec<String>,
        params: BoostingParams,
    ) -> Result<Self> {
        ensure!(!x.is_empty(), "cannot fit on an empty training set");
        ensure!(
            x.len() == y.len(),
            "feature rows ({}) and labels ({}) differ in length",
            x.len(),
            y.len()
        );
        ensure!(
            x.iter().all(|r| r.len() == feature_names.len()),
            "every row must have {} features",
            feature_names.len()
        );
        ensure!(
            y.iter().all(|&v| v == 0.0 || v == 1.0),
            "labels must be 0 or 1"
        );
        if params.loss_function != "Logloss" {
            bail!("unsupported loss function '{}'", params.loss_function);
        }
        ensure!(params.learning_rate > 0.0, "learning rate must be positive");

        let prior = (y.iter().sum::<f64>() / y.len() as f64).clamp(PROB_EPS, 1.0 - PROB_EPS);
        let base_score = (prior / (1.0 - prior)).ln();

        let binned = BinnedMatrix::new(x, feature_names.len(), params.max_bins.max(1));
        let tree_params = TreeParams {
            max_depth: params.depth,
            l2_leaf_reg: params.l2_leaf_reg,
            min_samples_leaf: params.min_samples_leaf,
        };

        info!(
            "Fitting {} trees (depth {}, lr {}) on {} rows x {} features",
            params.iterations,
            params.depth,
            params.learning_rate,
            x.len(),
            feature_names.len()
        );

        let mut raw = vec![base_score; x.len()];
        let mut trees = Vec::with_capacity(params.iterations);
        let mut grad = vec![0.0; x.len()];
        let mut hess = vec![0.0; x.len()];

        for iteration in 0..params.iterations {
            for i in 0..x.len() {
                let p = sigmoid(raw[i]);
                grad[i] = p - y[i];
                hess[i] = (p * (1.0 - p)).max(1e-12);
            }

            let tree = RegressionTree::fit(&binned, &grad, &hess, &tree_params);
            for (i, row) in x.iter().enumerate() {
                raw[i] += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);

            if params.verbose > 0 && (iteration + 1) % params.verbose == 0 {
                let loss = log_loss_from_raw(&raw, y);
                info!("iteration {}: train logloss {:.6}", iteration + 1, loss);
            }
        }

        Ok(Self {
            format_version: FORMAT_VERSION,
            feature_names,
            base_score,
            learning_rate: params.learning_rate,
            params,
            trained_at: Utc::now(),
            trees,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Raw log-odds for one row.
    pub fn predict_raw(&self, row: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|t| self.learning_rate * t.predict(row))
                .sum::<f64>()
    }

    /// Probability of the positive class for every row.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let width = self.feature_names.len();
        if let Some(bad) = x.iter().position(|r| r.len() != width) {
            bail!(
                "row {} has {} features, model expects {}",
                bad,
                x[bad].len(),
                width
            );
        }
        Ok(x.iter().map(|r| sigmoid(self.predict_raw(r))).collect())
    }

    /// Write the model as JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create model directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create model file {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), self).context("Failed to serialize model")?;
        debug!("Model written to {}", path.display());
        Ok(())
    }

    /// Load a model previously written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open model file {}", path.display()))?;
        let model: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse model file {}", path.display()))?;

        if model.format_version != FORMAT_VERSION {
            bail!(
                "unsupported model format version {} (expected {})",
                model.format_version,
                FORMAT_VERSION
            );
        }
        let width = model.feature_names.len();
        if model.trees.iter().any(|t| t.max_feature().is_some_and(|f| f >= width)) {
            bail!("model references a feature index beyond its {} features", width);
        }
        for (i, tree) in model.trees.iter().enumerate() {
            tree.check_structure()
                .with_context(|| format!("Malformed tree {} in model file {}", i, path.display()))?;
        }
        Ok(model)
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn log_loss_from_raw(raw: &[f64], y: &[f64]) -> f64 {
    let probs: Vec<f64> = raw.iter().map(|&z| sigmoid(z)).collect();
    crate::model::metrics::log_loss(y, &probs)
}
