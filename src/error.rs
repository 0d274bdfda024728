//! Errors raised inside pipeline stages before they are folded into
//! status strings at the operation boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Classifier failure, already rendered with its cause chain.
    #[error("{0}")]
    Model(String),

    #[error("feature mismatch: {0}")]
    FeatureMismatch(String),
}

impl PipelineError {
    pub fn model(err: anyhow::Error) -> Self {
        Self::Model(format!("{err:#}"))
    }
}

