//! # Agent Crate
//!
//! Tabular value learning for the recommender.
//!
//! The agent keeps one pair of action values per observation it has seen
//! and chooses between exploring, exploiting those values, and imitating a
//! simulated user whose taste is the configured genre likeness table.
//!
//! Two drivers share the same learner:
//! - [`Agent::run_autonomous`] trains offline against the simulated user
//! - [`Agent::run_interactive`] advances one step per remote request

pub mod agent;
pub mod config;
pub mod error;
pub mod value_table;

pub use agent::{Agent, TrainingSummary};
pub use config::{AgentConfig, LIKENESS_TOLERANCE, LikenessTable};
pub use error::{AgentError, Result};
pub use value_table::{ActionValues, ValueTable};
