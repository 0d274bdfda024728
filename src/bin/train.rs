//! Train the material property classifier.
//!
//! Usage:
//!   train --data-path data/train.csv --model-output model/gbdt_model.json

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::{error, info};

use material_agent::config::{self, AppConfig};
use material_agent::logging;
use material_agent::training;

#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(version)]
#[command(about = "Train a material property prediction model")]
struct Cli {
    /// Path to the training data CSV file (columns Substance, label).
    #[arg(long)]
    data_path: Option<String>,

    /// Path to save the trained model.
    #[arg(long)]
    model_output: Option<String>,

    /// Proportion of the dataset held out for evaluation.
    #[arg(long)]
    test_size: Option<f64>,

    /// Random seed for the split.
    #[arg(long)]
    random_state: Option<u64>,

    /// Boosting iterations.
    #[arg(long)]
    iterations: Option<usize>,

    #[arg(long)]
    learning_rate: Option<f64>,

    /// Maximum tree depth.
    #[arg(long)]
    depth: Option<usize>,

    /// Log held-out metrics after training.
    #[arg(long)]
    show_metrics: bool,

    /// Config file (TOML). Defaults to the per-user config location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file; overrides the config value.
    #[arg(long)]
    log_file: Option<String>,

    /// Log level (debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        let training = &mut config.training;
        if let Some(v) = &self.data_path {
            training.data_path = v.clone();
        }
        if let Some(v) = &self.model_output {
            training.model_output_path = v.clone();
        }
        if let Some(v) = self.test_size {
            training.test_size = v;
        }
        if let Some(v) = self.random_state {
            training.random_state = v;
        }
        if let Some(v) = self.iterations {
            training.iterations = v;
        }
        if let Some(v) = self.learning_rate {
            training.learning_rate = v;
        }
        if let Some(v) = self.depth {
            training.depth = v;
        }
        if let Some(v) = &self.log_file {
            config.log_file = v.clone();
        }
        if let Some(v) = &self.log_level {
            config.log_level = v.clone();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&config_path)?;
    cli.apply(&mut config);

    logging::init_logging(
        &PathBuf::from(config.resolved_log_file()),
        &config.log_level,
    )?;
    info!("Starting model training process");

    match training::run_training(&config.training, cli.show_metrics) {
        Ok(report) => {
            info!(
                "Training process completed: {} trees, {} train / {} test rows",
                report.n_trees, report.n_train, report.n_test
            );
            println!(
                "{} Model successfully trained and saved to: {}",
                ">>>".green().bold(),
                report.model_path.display()
            );
        }
        Err(e) => {
            error!("Error during training: {:#}", e);
            println!("{} Error during training: {:#}", ">>>".red().bold(), e);
        }
    }
    Ok(())
}
