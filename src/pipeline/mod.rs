//! The four-stage material screening pipeline: read, predict, match, save.
//!
//! Every operation takes a single string argument and returns a
//! [`ToolOutcome`]. Failures are logged and turned into descriptive
//! messages; nothing propagates past an operation call, because the caller
//! is an agent that can only observe text.

pub mod dataset;
pub mod paths;
pub mod table;

pub use dataset::MaterialDataset;
pub use paths::{ensure_parent_dir, sanitize_path};
pub use table::Table;

use crate::chem::ElementPropertyFeaturizer;
use crate::error::PipelineError;
use crate::model::GradientBoostedClassifier;
use crate::types::ToolOutcome;
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info, warn, Span};

/// One session's pipeline. Owns its dataset and logging span.
#[derive(Debug)]
pub struct MaterialPipeline {
    dataset: MaterialDataset,
    featurizer: ElementPropertyFeaturizer,
    span: Span,
}

impl Default for MaterialPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialPipeline {
    /// Create a pipeline with an empty dataset and a fresh session span.
    pub fn new() -> Self {
        Self::with_span(crate::logging::session_span("pipeline"))
    }

    /// Create a pipeline that logs under an existing span.
    pub fn with_span(span: Span) -> Self {
        Self {
            dataset: MaterialDataset::default(),
            featurizer: ElementPropertyFeaturizer::magpie(),
            span,
        }
    }

    pub fn dataset(&self) -> &MaterialDataset {
        &self.dataset
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Read a CSV with a `Substance` column, parse and featurize every row.
    pub fn read_data(&mut self, file_path: &str) -> ToolOutcome {
        let span = self.span.clone();
        let _enter = span.enter();

        let file_path = sanitize_path(file_path);
        info!("Reading data file: {}", file_path);

        let path = Path::new(&file_path);
        if !path.exists() {
            return rejected(format!("File does not exist: {}", file_path));
        }

        let loaded = Table::read_csv(path)
            .and_then(|table| MaterialDataset::from_table(table, &self.featurizer));
        match loaded {
            Ok(dataset) => {
                let records = dataset.len();
                let parsed = dataset.parsed_count();
                let features = dataset.features().map_or(0, |f| f.n_columns());
                self.dataset = dataset;

                info!(
                    "Successfully read material expressions: {} rows, {} parsed, {} features",
                    records, parsed, features
                );
                ToolOutcome::ok(
                    format!("Successfully read material expressions, total {} records", records),
                    json!({ "records": records, "parsed": parsed, "features": features }),
                )
            }
            Err(e) => failed("Failed to read data", e),
        }
    }

    // -----------------------------------------------------------------------
    // Predict
    // -----------------------------------------------------------------------

    /// Score every row with a saved classifier and sort by descending score.
    pub fn model_predict(&mut self, model_path: &str) -> ToolOutcome {
        let span = self.span.clone();
        let _enter = span.enter();

        let model_path = sanitize_path(model_path);
        info!("Using model for prediction: {}", model_path);

        let Some(features) = self.dataset.features() else {
            return rejected("Please read data first");
        };
        let path = Path::new(&model_path);
        if !path.exists() {
            return rejected(format!("Model file does not exist: {}", model_path));
        }

        let scored = GradientBoostedClassifier::load(path)
            .map_err(PipelineError::model)
            .and_then(|model| {
                if model.feature_names() != features.columns.as_slice() {
                    return Err(PipelineError::FeatureMismatch(format!(
                        "model was trained on {} features, dataset has {}",
                        model.feature_names().len(),
                        features.n_columns()
                    )));
                }
                model
                    .predict_proba(&features.rows)
                    .map_err(PipelineError::model)
            });

        match scored {
            Ok(scores) => {
                let records = scores.len();
                self.dataset.apply_scores(scores);
                let top = self.dataset.scores().and_then(|s| s.first().copied());

                info!("Model prediction completed for {} records", records);
                ToolOutcome::ok(
                    "Model prediction completed successfully",
                    json!({ "records": records, "top_score": top }),
                )
            }
            Err(e) => failed("Model prediction failed", e),
        }
    }

    // -----------------------------------------------------------------------
    // Match
    // -----------------------------------------------------------------------

    /// Keep rows whose composition contains any of the comma-separated elements.
    pub fn rule_match(&mut self, rule_elements: &str) -> ToolOutcome {
        let span = self.span.clone();
        let _enter = span.enter();

        info!("Performing rule matching: {}", rule_elements);

        if self.dataset.compositions().is_none() {
            return rejected("Please read data first");
        }

        let elements = parse_element_list(rule_elements);
        if elements.is_empty() {
            warn!("No element symbols given, nothing will match");
        }
        let wanted: HashSet<String> = elements.iter().cloned().collect();

        let Some((flags, matched)) = self.dataset.compute_match(&wanted) else {
            return rejected("Please read data first");
        };
        let count = matched.len();
        self.dataset.apply_match(flags, matched);

        info!("Rule matching completed, found {} matching materials", count);
        ToolOutcome::ok(
            format!(
                "Rule matching completed successfully, found {} materials containing specified elements",
                count
            ),
            json!({ "matched": count, "elements": elements }),
        )
    }

    // -----------------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------------

    /// Write the matched subset to a CSV file.
    pub fn save_result(&mut self, save_path: &str) -> ToolOutcome {
        let span = self.span.clone();
        let _enter = span.enter();

        let save_path = sanitize_path(save_path);
        info!("Saving results to: {}", save_path);

        let Some(matched) = self.dataset.matched() else {
            return rejected("Please perform rule matching first");
        };

        let path = Path::new(&save_path);
        let written = ensure_parent_dir(path)
            .map_err(PipelineError::from)
            .and_then(|()| matched.write_csv(path));

        match written {
            Ok(()) => {
                let records = matched.len();
                info!("Results saved to {}", save_path);
                ToolOutcome::ok(
                    format!(
                        "Results successfully saved to {}, total {} records",
                        save_path, records
                    ),
                    json!({ "path": save_path, "records": records }),
                )
            }
            Err(e) => failed("Failed to save results", e),
        }
    }
}

/// Split a comma-separated element list, trimming and dropping empties.
/// Duplicates are removed, first occurrence wins.
pub fn parse_element_list(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}

fn rejected(message: impl Into<String>) -> ToolOutcome {
    let message = message.into();
    error!("{}", message);
    ToolOutcome::fail(message)
}

fn failed(context: &str, err: PipelineError) -> ToolOutcome {
    let message = format!("{}: {}", context, err);
    error!(error = ?err, "{}", message);
    ToolOutcome::fail(message)
}
