//! # Environment Crate
//!
//! The episodic environment the recommender learns in.
//!
//! An episode starts from a random catalog entry. Every step the agent (or a
//! remote user) answers with an action:
//! - **Upvote**: the next observations come from movies sharing a genre with
//!   the current one
//! - **Downvote**: the next observations come from movies sharing none of its
//!   genres
//!
//! Observations are served from a prefetched batch, so the catalog is only
//! queried once per `batch_size` steps.
//!
//! ## Example Usage
//!
//! ```ignore
//! use environment::{Action, EnvironmentConfig, EpisodeController};
//! use std::sync::Arc;
//!
//! let mut controller = EpisodeController::new(Arc::new(catalog), EnvironmentConfig::default())?;
//! let first = controller.reset()?;
//! let step = controller.step(Action::Upvote)?;
//! println!("{} -> {} (reward {})", first.title, step.observation.title, step.reward);
//! ```

pub mod controller;
pub mod error;
pub mod types;

pub use controller::{EpisodeController, IDLE_CURSOR, Step};
pub use error::{EnvironmentError, Result};
pub use types::{Action, EnvironmentConfig};
