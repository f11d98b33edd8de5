//! Learning Agent - tabular value learning over episodes
//!
//! ## Policy
//! One uniform draw `u` picks the behaviour for a step:
//! 1. `u <= epsilon`: explore, a fair coin between upvote and downvote
//! 2. `epsilon < u < min(1, epsilon + 0.25)`: exploit the value table
//! 3. `max(0, epsilon + 0.25) < u < min(1, epsilon + 1)`: simulate a user,
//!    upvoting with probability equal to the summed likeness of the
//!    observation's genres
//! 4. anything else (band edges): downvote
//!
//! ## Update
//! `td = reward + discount * future * Q(s, a)` with `future` the best value
//! of the next observation (0 on termination), then `Q(s, a) += lr * td`.
//! The product `future * Q(s, a)` is kept as the established rule even
//! though textbook Q-learning subtracts `Q(s, a)` instead.

use crate::config::{AgentConfig, LikenessTable};
use crate::error::{AgentError, Result};
use crate::value_table::ValueTable;
use catalog::Observation;
use environment::{Action, EnvironmentError, EpisodeController};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// Width of the exploitation band above epsilon
const EXPLOIT_BAND: f64 = 0.25;

/// Outcome of an offline training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub episodes_completed: usize,
    pub episodes_aborted: usize,
    pub steps: usize,
    pub final_epsilon: f64,
    pub mean_td_error: f64,
}

/// The recommender's learner: value table, exploration schedule and the
/// episode it is currently in.
pub struct Agent {
    values: ValueTable,
    epsilon: f64,
    epsilon_decay: f64,
    epsilon_floor: f64,
    learning_rate: f64,
    discount: f64,
    controller: EpisodeController,
    likeness: LikenessTable,
    /// Genres already reported as missing from the likeness table
    warned_genres: HashSet<String>,
    /// TD error of every update, for diagnostics
    training_error: Vec<f64>,
    /// Last observation served by `run_interactive`; `None` until the
    /// first call (and after a failed step)
    previous_observation: Option<Observation>,
    episodes_completed: usize,
    rng: StdRng,
}

impl Agent {
    /// Create an agent with an OS-seeded random source
    pub fn new(config: &AgentConfig, controller: EpisodeController) -> Result<Self> {
        Self::with_rng(config, controller, StdRng::from_os_rng())
    }

    /// Create an agent with a caller-provided random source
    pub fn with_rng(config: &AgentConfig, controller: EpisodeController, rng: StdRng) -> Result<Self> {
        let likeness = config.validate()?;
        Ok(Self {
            values: ValueTable::new(),
            epsilon: config.epsilon,
            epsilon_decay: config.epsilon_decay,
            epsilon_floor: config.epsilon_floor,
            learning_rate: config.learning_rate,
            discount: config.discount,
            controller,
            likeness,
            warned_genres: HashSet::new(),
            training_error: Vec::new(),
            previous_observation: None,
            episodes_completed: 0,
            rng,
        })
    }

    /// Start from previously learned values (builder pattern)
    pub fn with_value_table(mut self, values: ValueTable) -> Self {
        self.values = values;
        self
    }

    /// Choose an action for `observation` (see the module docs for the bands)
    pub fn select_action(&mut self, observation: &Observation) -> Action {
        let u: f64 = self.rng.random();
        let epsilon = self.epsilon;

        if u <= epsilon {
            if self.rng.random_bool(0.5) {
                Action::Upvote
            } else {
                Action::Downvote
            }
        } else if epsilon < u && u < (epsilon + EXPLOIT_BAND).min(1.0) {
            self.values.best_action(observation)
        } else if (epsilon + EXPLOIT_BAND).max(0.0) < u && u < (epsilon + 1.0).min(1.0) {
            let cumulative = self.likeness_of(observation);
            let v: f64 = self.rng.random();
            if v <= cumulative {
                Action::Upvote
            } else {
                Action::Downvote
            }
        } else {
            warn!("Unhandled policy draw u={} (epsilon={}), downvoting", u, epsilon);
            Action::Downvote
        }
    }

    /// Summed likeness of the observation's genres; genres missing from the
    /// table are skipped and reported once each
    fn likeness_of(&mut self, observation: &Observation) -> f64 {
        let mut cumulative = 0.0;
        for genre in &observation.genres {
            match self.likeness.get(genre) {
                Some(p) => cumulative += p,
                None => {
                    if self.warned_genres.insert(genre.clone()) {
                        warn!("Genre {:?} has no likeness entry, skipping it", genre);
                    }
                }
            }
        }
        cumulative
    }

    /// Apply one temporal-difference update and return its TD error
    pub fn update(
        &mut self,
        observation: &Observation,
        next_observation: &Observation,
        action: Action,
        reward: f64,
        terminated: bool,
    ) -> f64 {
        let future = if terminated {
            0.0
        } else {
            self.values.max_value(next_observation)
        };
        let current = self.values.value(observation, action);
        let td_error = reward + self.discount * future * current;

        self.values.entry(observation)[action.index()] += self.learning_rate * td_error;
        self.training_error.push(td_error);
        td_error
    }

    /// Lower epsilon by one decay step, never below the floor
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon - self.epsilon_decay).max(self.epsilon_floor);
    }

    /// Train offline for `n_episodes`.
    ///
    /// An episode that hits an empty batch is abandoned and training moves
    /// on; a failed `reset` ends the run with an error.
    pub fn run_autonomous(&mut self, n_episodes: usize) -> Result<TrainingSummary> {
        let errors_before = self.training_error.len();
        let mut completed = 0;
        let mut aborted = 0;

        for episode in 0..n_episodes {
            let mut observation = self.controller.reset()?;
            loop {
                let action = self.select_action(&observation);
                let step = match self.controller.step(action) {
                    Ok(step) => step,
                    Err(EnvironmentError::EmptyBatch { genres, mode }) => {
                        warn!("Episode {} aborted: no movies for {:?} {:?}", episode, mode, genres);
                        aborted += 1;
                        break;
                    }
                    Err(e) => return Err(e.into()),
                };

                self.update(&observation, &step.observation, action, step.reward, step.terminated);
                self.decay_epsilon();

                if step.terminated {
                    completed += 1;
                    self.episodes_completed += 1;
                    debug!("Episode {} finished, epsilon now {:.4}", episode, self.epsilon);
                    break;
                }
                observation = step.observation;
            }
        }

        let new_errors = &self.training_error[errors_before..];
        let mean_td_error = if new_errors.is_empty() {
            0.0
        } else {
            new_errors.iter().sum::<f64>() / new_errors.len() as f64
        };
        let summary = TrainingSummary {
            episodes_completed: completed,
            episodes_aborted: aborted,
            steps: new_errors.len(),
            final_epsilon: self.epsilon,
            mean_td_error,
        };
        info!(
            "Training done: {} episodes ({} aborted), {} steps, epsilon {:.4}, {} table rows",
            summary.episodes_completed,
            summary.episodes_aborted,
            summary.steps,
            summary.final_epsilon,
            self.values.len()
        );
        Ok(summary)
    }

    /// One step driven by a remote caller.
    ///
    /// The first call resets and returns the opening observation, ignoring
    /// `action`. Later calls step with `action`, learn from the transition
    /// and return the next observation. After a failed step the next call
    /// starts over with a reset.
    #[instrument(skip(self))]
    pub fn run_interactive(&mut self, action: Action) -> Result<Observation> {
        let Some(previous) = self.previous_observation.take() else {
            let first = self.controller.reset()?;
            self.previous_observation = Some(first.clone());
            return Ok(first);
        };

        let step = self.controller.step(action).map_err(|e| {
            warn!("Interactive step failed, next call starts a new episode: {}", e);
            AgentError::from(e)
        })?;

        let td_error = self.update(&previous, &step.observation, action, step.reward, step.terminated);
        debug!(
            "{} -> {} (reward {}, td {:.4}, terminated {})",
            previous.id, step.observation.id, step.reward, td_error, step.terminated
        );
        if step.terminated {
            self.episodes_completed += 1;
        }

        self.previous_observation = Some(step.observation.clone());
        Ok(step.observation)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn value_table(&self) -> &ValueTable {
        &self.values
    }

    pub fn training_error(&self) -> &[f64] {
        &self.training_error
    }

    pub fn episodes_completed(&self) -> usize {
        self.episodes_completed
    }

    pub fn controller(&self) -> &EpisodeController {
        &self.controller
    }
}
