//! Material analysis agent.
//!
//! Usage:
//!   material-agent --query "Read data.csv and match Fe,Co"   Answer one query
//!   material-agent --web                                     Serve the web form
//!   material-agent                                           Prompt for a query

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};

use material_agent::agent::MaterialAgent;
use material_agent::config::{self, AppConfig};
use material_agent::logging;
use material_agent::web::{self, AppState};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "material-agent")]
#[command(version)]
#[command(about = "Language-model agent over a material screening pipeline")]
struct Cli {
    /// Query to analyze.
    #[arg(long, conflicts_with = "web")]
    query: Option<String>,

    /// Start the web interface.
    #[arg(long)]
    web: bool,

    /// Config file (TOML). Defaults to the per-user config location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// API key for the chat-completions endpoint.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long)]
    base_url: Option<String>,

    /// Model name.
    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    temperature: Option<f64>,

    /// Model turns allowed per query.
    #[arg(long)]
    max_turns: Option<usize>,

    /// Log file; overrides the config value.
    #[arg(long)]
    log_file: Option<String>,

    /// Log level (debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Address for the web interface.
    #[arg(long)]
    bind: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(v) = &self.base_url {
            config.llm.base_url = v.clone();
        }
        if let Some(v) = &self.model {
            config.llm.model = v.clone();
        }
        if let Some(v) = self.temperature {
            config.llm.temperature = v;
        }
        if let Some(v) = self.max_turns {
            config.llm.max_turns = v;
        }
        if let Some(v) = &self.log_file {
            config.log_file = v.clone();
        }
        if let Some(v) = &self.log_level {
            config.log_level = v.clone();
        }
        if let Some(v) = &self.bind {
            config.bind = v.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&config_path)?;
    cli.apply(&mut config);

    logging::init_logging(
        &PathBuf::from(config.resolved_log_file()),
        &config.log_level,
    )?;
    info!("Starting material analysis application");

    if cli.web {
        println!(
            "{} Serving web interface on http://{}",
            ">>>".green().bold(),
            config.bind
        );
        return web::serve(AppState::new(config)).await;
    }

    let query = match cli.query.clone() {
        Some(q) => q,
        None => prompt_query()?,
    };
    if query.trim().is_empty() {
        println!("{} Please enter a query.", ">>>".red().bold());
        return Ok(());
    }

    let Some(api_key) = cli.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        error!("No API key configured");
        println!(
            "{} No API key: pass --api-key or set OPENAI_API_KEY",
            ">>>".red().bold()
        );
        return Ok(());
    };

    let mut agent = MaterialAgent::from_config(&config.llm, api_key.trim());
    let result = agent.run(&query).await;

    println!("{}", result);
    info!("Application execution completed");
    Ok(())
}

fn prompt_query() -> Result<String> {
    print!("Enter your analysis query: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read query from stdin")?;
    Ok(line.trim().to_string())
}
