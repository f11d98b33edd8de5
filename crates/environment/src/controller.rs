//! Episode Controller - catalog sampling conditioned on feedback
//!
//! Turns the catalog into a sequence of observations. Each `step` serves the
//! next observation from a prefetched batch; when the batch runs out, a new
//! one is drawn from movies that share (upvote) or avoid (downvote) the
//! genres of the current observation.
//!
//! ## States
//! - IDLE: no batch loaded, `cursor == IDLE_CURSOR`
//! - ACTIVE: batch loaded, `cursor` in `[0, batch_size)`
//!
//! Termination moves the controller back to IDLE.

use crate::error::{EnvironmentError, Result};
use crate::types::{Action, EnvironmentConfig};
use catalog::{Catalog, Observation};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Cursor value meaning "no batch loaded"; larger than any real batch size
pub const IDLE_CURSOR: usize = 1 << 31;

/// Result of one `step`
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
}

/// Drives episodes over a shared catalog
pub struct EpisodeController {
    catalog: Arc<dyn Catalog>,
    config: EnvironmentConfig,
    current_observation: Option<Observation>,
    prefetched_batch: Vec<Observation>,
    cursor: usize,
    episode_index: usize,
}

impl EpisodeController {
    /// Create an idle controller; validates the configuration
    pub fn new(catalog: Arc<dyn Catalog>, config: EnvironmentConfig) -> Result<Self> {
        config.validate().map_err(EnvironmentError::ConfigInvalid)?;
        Ok(Self {
            catalog,
            config,
            current_observation: None,
            prefetched_batch: Vec::new(),
            cursor: IDLE_CURSOR,
            episode_index: 0,
        })
    }

    /// Start a fresh episode from a random catalog entry.
    ///
    /// Any prefetched batch is dropped, since it was drawn for the previous
    /// observation's genres.
    pub fn reset(&mut self) -> Result<Observation> {
        let observation = self.catalog.random_entry()?;
        info!("Episode reset, first entry: {} ({})", observation.title, observation.id);

        self.current_observation = Some(observation.clone());
        self.prefetched_batch.clear();
        self.cursor = IDLE_CURSOR;
        self.episode_index = 0;
        Ok(observation)
    }

    /// Advance one step in response to `action`.
    ///
    /// `terminated` is computed from the episode index *before* it is
    /// incremented, so it first becomes true on call `max_episodes + 2`
    /// after a reset (index `max_episodes + 1`).
    #[instrument(skip(self), fields(cursor = self.cursor, episode_index = self.episode_index))]
    pub fn step(&mut self, action: Action) -> Result<Step> {
        let genres = match &self.current_observation {
            Some(current) => current.genres.clone(),
            None => return Err(EnvironmentError::NotStarted),
        };

        if self.needs_refill() {
            self.refill(genres, action)?;
        }

        let reward = self.config.reward_for(action);
        let observation = self.prefetched_batch[self.cursor].clone();
        let terminated = self.episode_index > self.config.max_episodes;

        self.episode_index += 1;
        self.current_observation = Some(observation.clone());
        self.cursor += 1;

        if terminated {
            debug!("Episode terminated after {} steps", self.episode_index);
            self.cursor = IDLE_CURSOR;
            self.episode_index = 0;
        }

        Ok(Step {
            observation,
            reward,
            terminated,
        })
    }

    /// A refill is due when idle or when the batch is used up. The length
    /// check only matters for under-filled batches.
    fn needs_refill(&self) -> bool {
        self.cursor == IDLE_CURSOR
            || self.cursor >= self.config.batch_size
            || self.cursor >= self.prefetched_batch.len()
    }

    fn refill(&mut self, genres: Vec<String>, action: Action) -> Result<()> {
        let mode = action.genre_match();
        let batch = match self.catalog.batch(&genres, mode, self.config.batch_size) {
            Ok(batch) => batch,
            Err(e) => {
                self.abort_episode();
                return Err(e.into());
            }
        };

        if batch.is_empty() {
            warn!("Empty batch for {:?} {:?}, aborting episode", mode, genres);
            self.abort_episode();
            return Err(EnvironmentError::EmptyBatch { genres, mode });
        }

        debug!("Prefetched {} observations ({:?})", batch.len(), mode);
        self.prefetched_batch = batch;
        self.cursor = 0;
        Ok(())
    }

    /// Drop back to IDLE without touching the current observation
    fn abort_episode(&mut self) {
        self.prefetched_batch.clear();
        self.cursor = IDLE_CURSOR;
        self.episode_index = 0;
    }

    pub fn current_observation(&self) -> Option<&Observation> {
        self.current_observation.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn episode_index(&self) -> usize {
        self.episode_index
    }

    pub fn is_idle(&self) -> bool {
        self.cursor == IDLE_CURSOR
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }
}
