//! Actions and environment configuration.

use catalog::GenreMatch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two signals a user (or the agent) can give about a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Upvote,
    Downvote,
}

impl Action {
    /// Both actions, in table order
    pub const ALL: [Action; 2] = [Action::Upvote, Action::Downvote];

    /// Position of this action in per-state value arrays
    pub fn index(self) -> usize {
        match self {
            Action::Upvote => 0,
            Action::Downvote => 1,
        }
    }

    /// Map a raw label onto an action: the upvote label gives `Upvote`,
    /// anything else gives `Downvote`.
    pub fn from_label(label: &str, labels: &[String; 2]) -> Self {
        if label == labels[0] {
            Action::Upvote
        } else {
            Action::Downvote
        }
    }

    /// Which side of the genre filter a refill after this action draws from
    pub fn genre_match(self) -> GenreMatch {
        match self {
            Action::Upvote => GenreMatch::Match,
            Action::Downvote => GenreMatch::Exclude,
        }
    }
}

fn default_render_mode() -> String {
    "human".to_string()
}

/// Episode configuration, read from the `env` section of the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Raw labels for `[Upvote, Downvote]`
    pub actions: [String; 2],
    /// Rewards for `[Upvote, Downvote]`
    pub rewards: [f64; 2],
    /// Carried for display only; no logic depends on it
    #[serde(default = "default_render_mode")]
    pub render_mode: String,
    /// Episode cap (see `EpisodeController::step` for how it is applied)
    pub max_episodes: usize,
    /// How many observations one catalog refill prefetches
    pub batch_size: usize,
}

impl EnvironmentConfig {
    pub fn reward_for(&self, action: Action) -> f64 {
        self.rewards[action.index()]
    }

    pub fn action_for_label(&self, label: &str) -> Action {
        Action::from_label(label, &self.actions)
    }

    /// Check the values serde cannot
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        if self.actions[0] == self.actions[1] {
            return Err(format!(
                "upvote and downvote labels must differ (both are {:?})",
                self.actions[0]
            ));
        }
        Ok(())
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            actions: ["like".to_string(), "dislike".to_string()],
            rewards: [1.0, -1.0],
            render_mode: default_render_mode(),
            max_episodes: 20,
            batch_size: 32,
        }
    }
}

impl fmt::Display for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== Environment =====")?;
        writeln!(
            f,
            "actions:      {} -> Upvote, {} -> Downvote",
            self.actions[0], self.actions[1]
        )?;
        writeln!(
            f,
            "rewards:      Upvote {}, Downvote {}",
            self.rewards[0], self.rewards[1]
        )?;
        writeln!(f, "render_mode:  {}", self.render_mode)?;
        writeln!(f, "max_episodes: {}", self.max_episodes)?;
        writeln!(f, "batch_size:   {}", self.batch_size)?;
        write!(f, "=======================")
    }
}
