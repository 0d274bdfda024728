//! Classifier training job: load, split, fit, evaluate, save.

pub mod data;

pub use data::{load_labeled_csv, train_test_split, LabeledData, Split};

use crate::chem::ElementPropertyFeaturizer;
use crate::config::TrainingConfig;
use crate::model::{ClassificationMetrics, GradientBoostedClassifier};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model_path: PathBuf,
    pub n_train: usize,
    pub n_test: usize,
    pub dropped: usize,
    pub n_trees: usize,
    /// Held-out metrics; `None` when nothing was held out.
    pub metrics: Option<ClassificationMetrics>,
}

/// Train a classifier as configured and save it.
///
/// Metrics are always computed on the held-out rows but only logged when
/// `show_metrics` is set.
pub fn run_training(config: &TrainingConfig, show_metrics: bool) -> Result<TrainingReport> {
    let data_path = PathBuf::from(config.resolved_data_path());
    if !data_path.exists() {
        bail!("Training data file not found: {}", data_path.display());
    }
    info!("Training with data from: {}", data_path.display());

    let featurizer = ElementPropertyFeaturizer::magpie();
    let data = load_labeled_csv(&data_path, &featurizer)?;
    let split = train_test_split(data.len(), config.test_size, config.random_state)?;
    let (x_train, y_train) = data.select(&split.train);
    let (x_test, y_test) = data.select(&split.test);
    info!(
        "Split: {} training rows, {} test rows (seed {})",
        x_train.len(),
        x_test.len(),
        config.random_state
    );

    let model = GradientBoostedClassifier::fit(
        &x_train,
        &y_train,
        featurizer.feature_labels(),
        config.boosting_params(),
    )
    .context("Model training failed")?;

    let metrics = if x_test.is_empty() {
        None
    } else {
        let proba = model.predict_proba(&x_test)?;
        Some(ClassificationMetrics::evaluate(&y_test, &proba))
    };
    if show_metrics {
        match &metrics {
            Some(m) => info!("Test metrics: {}", m),
            None => info!("No test rows held out; metrics skipped"),
        }
    }

    let model_path = PathBuf::from(config.resolved_model_output_path());
    save_model(&model, &model_path)?;

    Ok(TrainingReport {
        model_path,
        n_train: x_train.len(),
        n_test: x_test.len(),
        dropped: data.dropped,
        n_trees: model.n_trees(),
        metrics,
    })
}

fn save_model(model: &GradientBoostedClassifier, path: &Path) -> Result<()> {
    model
        .save(path)
        .with_context(|| format!("Failed to save model to {}", path.display()))?;
    info!("Model saved to: {}", path.display());
    Ok(())
}
