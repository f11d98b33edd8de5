//! Process configuration, loaded from one JSON file.
//!
//! ```json
//! {
//!   "env":    { "actions": ["like", "dislike"], "rewards": [1.0, -1.0],
//!               "max_episodes": 20, "batch_size": 32 },
//!   "model":  { "lr": 0.1, "eps": 1.0, "eps_decay": 0.001, "eps_final": 0.1,
//!               "gamma": 0.95, "likeness": { "Comedy": 0.5, "Drama": 0.5 },
//!               "training_episodes": 500 },
//!   "server": { "host": "127.0.0.1", "port": 7878 },
//!   "paths":  { "data_dir": "data/ml-latest-small",
//!               "value_table": "resource/model/value_table.json" }
//! }
//! ```

use agent::AgentConfig;
use anyhow::{Context, Result, anyhow};
use environment::EnvironmentConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "resource/cfg/config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub env: EnvironmentConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Agent hyperparameters plus offline training settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(flatten)]
    pub agent: AgentConfig,
    #[serde(default = "default_training_episodes")]
    pub training_episodes: usize,
}

fn default_training_episodes() -> usize {
    500
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// MovieLens-style directory with links.csv, movies.csv and ratings.csv
    pub data_dir: PathBuf,
    /// Value table loaded at startup and saved at shutdown, when set
    #[serde(default)]
    pub value_table: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/ml-latest-small"),
            value_table: None,
        }
    }
}

impl Config {
    /// Read and parse the config file. Call `validate` before using it.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Reject configurations the process must not start with
    pub fn validate(&self) -> Result<()> {
        self.env
            .validate()
            .map_err(|reason| anyhow!("Invalid env section: {}", reason))?;
        self.model
            .agent
            .validate()
            .context("Invalid model section")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "env": { "actions": ["like", "dislike"], "rewards": [1.0, -1.0],
                 "render_mode": "human", "max_episodes": 20, "batch_size": 32 },
        "model": { "lr": 0.1, "eps": 1.0, "eps_decay": 0.001, "eps_final": 0.1,
                   "gamma": 0.95, "likeness": { "Comedy": 0.6, "Drama": 0.4 },
                   "training_episodes": 50 },
        "server": { "host": "0.0.0.0", "port": 9000 },
        "paths": { "data_dir": "data/small", "value_table": "model.json" }
    }"#;

    fn write_config(text: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, text).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_full_config() {
        let (_dir, path) = write_config(SAMPLE);
        let config = Config::load(&path).unwrap();

        assert_eq!(config.env.batch_size, 32);
        assert_eq!(config.model.agent.learning_rate, 0.1);
        assert_eq!(config.model.agent.discount, 0.95);
        assert_eq!(config.model.training_episodes, 50);
        assert_eq!(config.server.addr(), "0.0.0.0:9000");
        assert_eq!(config.paths.value_table, Some(PathBuf::from("model.json")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let (_dir, path) = write_config(
            r#"{
                "env": { "actions": ["like", "dislike"], "rewards": [1.0, -1.0],
                         "max_episodes": 5, "batch_size": 4 },
                "model": { "lr": 0.1, "eps": 0.5, "eps_decay": 0.01, "eps_final": 0.1,
                           "gamma": 0.9, "likeness": { "Comedy": 1.0 } }
            }"#,
        );
        let config = Config::load(&path).unwrap();

        assert_eq!(config.env.render_mode, "human");
        assert_eq!(config.model.training_episodes, 500);
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[test]
    fn test_bad_likeness_fails_validation() {
        let (_dir, path) = write_config(&SAMPLE.replace("\"Drama\": 0.4", "\"Drama\": 0.5"));
        let config = Config::load(&path).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_fails_validation() {
        let (_dir, path) = write_config(&SAMPLE.replace("\"batch_size\": 32", "\"batch_size\": 0"));
        let config = Config::load(&path).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
