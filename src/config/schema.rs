//! Configuration schema for config.toml.

use crate::model::BoostingParams;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log file, appended to by every run.
    pub log_file: String,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub log_level: String,

    /// Address the web front end listens on.
    pub bind: String,

    /// Language model backend.
    pub llm: LlmConfig,

    /// Classifier training job.
    pub training: TrainingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_file: "material_analysis.log".into(),
            log_level: "info".into(),
            bind: "127.0.0.1:5000".into(),
            llm: LlmConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve a path that may contain `~` to an absolute path.
    pub fn resolve_path(&self, path: &str) -> String {
        shellexpand::tilde(path).into_owned()
    }

    /// Resolved log file path.
    pub fn resolved_log_file(&self) -> String {
        self.resolve_path(&self.log_file)
    }
}

/// `[llm]`: the OpenAI-compatible chat endpoint and agent limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Model turns allowed per query before the agent gives up.
    pub max_turns: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini-2024-07-18".into(),
            temperature: 0.3,
            max_tokens: 2048,
            max_turns: 15,
        }
    }
}

/// `[training]`: inputs, outputs and hyperparameters of the `train` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub data_path: String,
    pub model_output_path: String,
    pub test_size: f64,
    pub random_state: u64,
    pub verbose: usize,
    pub iterations: usize,
    pub learning_rate: f64,
    pub depth: usize,
    pub loss_function: String,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let params = BoostingParams::default();
        Self {
            data_path: "./data/train.csv".into(),
            model_output_path: "./model/gbdt_model.json".into(),
            test_size: 0.2,
            random_state: 42,
            verbose: params.verbose,
            iterations: params.iterations,
            learning_rate: params.learning_rate,
            depth: params.depth,
            loss_function: params.loss_function,
        }
    }
}

impl TrainingConfig {
    /// Boosting hyperparameters; the rest keep their defaults.
    pub fn boosting_params(&self) -> BoostingParams {
        BoostingParams {
            iterations: self.iterations,
            learning_rate: self.learning_rate,
            depth: self.depth,
            loss_function: self.loss_function.clone(),
            verbose: self.verbose,
            ..BoostingParams::default()
        }
    }

    pub fn resolved_data_path(&self) -> String {
        shellexpand::tilde(&self.data_path).into_owned()
    }

    pub fn resolved_model_output_path(&self) -> String {
        shellexpand::tilde(&self.model_output_path).into_owned()
    }
}
