//! Error types for the session layer.

use agent::AgentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Request bytes that do not decode to `{"action": <string>}`
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A previous interaction panicked while holding the agent lock
    #[error("Agent lock poisoned")]
    AgentPoisoned,

    #[error("Agent task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
