pub mod schema;

pub use schema::{AppConfig, LlmConfig, TrainingConfig};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default config file (`<config dir>/material-agent/config.toml`).
pub fn default_config_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.config_dir().join("material-agent").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&contents).context("Failed to parse config (TOML)")?;
        Ok(config)
    } else {
        Ok(AppConfig::default())
    }
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.llm.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(config.training.random_state, 42);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "log_level = \"debug\"\n[llm]\ntemperature = 0.0\n[training]\ndepth = 3\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.max_turns, 15);
        assert_eq!(config.training.depth, 3);
        assert_eq!(config.training.boosting_params().depth, 3);
        assert_eq!(config.training.iterations, 1000);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = AppConfig::default();
        config.bind = "0.0.0.0:8080".into();
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn tilde_is_expanded() {
        let config = AppConfig {
            log_file: "~/logs/a.log".into(),
            ..AppConfig::default()
        };
        assert!(config.resolved_log_file().ends_with("logs/a.log"));
        assert_eq!(config.resolve_path("plain.log"), "plain.log");
    }
}
