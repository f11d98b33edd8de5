//! Server crate for the reel-rl recommender.
//!
//! Configuration loading, the request wire format, and the TCP session
//! server that drives a single shared learning agent.

pub mod config;
pub mod error;
pub mod protocol;
pub mod session;

pub use config::{Config, DEFAULT_CONFIG_PATH, ModelConfig, PathsConfig, ServerConfig};
pub use error::{Result, SessionError};
pub use protocol::{decode_observation, decode_request, encode_observation};
pub use session::{SessionServer, SharedAgent};
