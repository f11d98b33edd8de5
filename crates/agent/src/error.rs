//! Error types for the agent crate.

use environment::EnvironmentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    /// Rejected configuration; the process must not start with it
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Failure while resetting or stepping the episode
    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// Value table could not be read or written
    #[error("Failed to persist value table at {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Value table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
