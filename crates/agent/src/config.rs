//! Agent hyperparameters and the genre likeness table.

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Allowed distance between the likeness sum and 1
pub const LIKENESS_TOLERANCE: f64 = 1e-3;

/// Learning parameters, read from the `model` section of the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(alias = "lr")]
    pub learning_rate: f64,
    /// Starting exploration probability
    #[serde(alias = "eps")]
    pub epsilon: f64,
    /// Subtracted from epsilon after every autonomous step
    #[serde(alias = "eps_decay")]
    pub epsilon_decay: f64,
    /// Epsilon never decays below this
    #[serde(alias = "eps_final")]
    pub epsilon_floor: f64,
    #[serde(alias = "gamma")]
    pub discount: f64,
    /// Genre -> probability that a simulated user upvotes it
    pub likeness: BTreeMap<String, f64>,
}

impl AgentConfig {
    /// Check epsilon bounds and build the likeness table
    pub fn validate(&self) -> Result<LikenessTable> {
        for (name, value) in [
            ("epsilon", self.epsilon),
            ("epsilon_decay", self.epsilon_decay),
            ("epsilon_floor", self.epsilon_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AgentError::ConfigInvalid(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.epsilon_floor > self.epsilon {
            return Err(AgentError::ConfigInvalid(format!(
                "epsilon_floor ({}) is above epsilon ({})",
                self.epsilon_floor, self.epsilon
            )));
        }
        LikenessTable::new(self.likeness.clone())
    }
}

/// Per-genre upvote probabilities of the simulated user.
///
/// Invariant: the probabilities sum to 1 within `LIKENESS_TOLERANCE`.
#[derive(Debug, Clone, PartialEq)]
pub struct LikenessTable {
    probabilities: BTreeMap<String, f64>,
}

impl LikenessTable {
    pub fn new(probabilities: BTreeMap<String, f64>) -> Result<Self> {
        let sum: f64 = probabilities.values().sum();
        if (sum - 1.0).abs() > LIKENESS_TOLERANCE {
            return Err(AgentError::ConfigInvalid(format!(
                "likeness probabilities sum to {}, expected {} <= sum <= {}",
                sum,
                1.0 - LIKENESS_TOLERANCE,
                1.0 + LIKENESS_TOLERANCE
            )));
        }
        Ok(Self { probabilities })
    }

    pub fn get(&self, genre: &str) -> Option<f64> {
        self.probabilities.get(genre).copied()
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(g, p)| (g.to_string(), *p)).collect()
    }

    #[test]
    fn test_likeness_summing_over_one_is_rejected() {
        let result = LikenessTable::new(table(&[("Action", 0.5), ("Drama", 0.3), ("Comedy", 0.3)]));
        assert!(matches!(result, Err(AgentError::ConfigInvalid(_))));
    }

    #[test]
    fn test_likeness_summing_to_one_is_accepted() {
        let likeness = LikenessTable::new(table(&[("Action", 0.4), ("Drama", 0.3), ("Comedy", 0.3)])).unwrap();
        assert_eq!(likeness.len(), 3);
        assert_eq!(likeness.get("Drama"), Some(0.3));
        assert_eq!(likeness.get("Western"), None);
    }

    #[test]
    fn test_likeness_tolerance_boundary() {
        assert!(LikenessTable::new(table(&[("Action", 0.5), ("Drama", 0.5005)])).is_ok());
        assert!(LikenessTable::new(table(&[("Action", 0.5), ("Drama", 0.4985)])).is_err());
    }

    #[test]
    fn test_empty_likeness_is_rejected() {
        assert!(LikenessTable::new(BTreeMap::new()).is_err());
    }

    #[test]
    fn test_config_accepts_short_key_names() {
        let config: AgentConfig = serde_json::from_str(
            r#"{"lr": 0.1, "eps": 1.0, "eps_decay": 0.01, "eps_final": 0.1, "gamma": 0.95,
                "likeness": {"Action": 0.6, "Drama": 0.4}}"#,
        )
        .unwrap();
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.epsilon_floor, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_epsilon_out_of_range() {
        let config = AgentConfig {
            learning_rate: 0.1,
            epsilon: 1.5,
            epsilon_decay: 0.01,
            epsilon_floor: 0.1,
            discount: 0.9,
            likeness: table(&[("Action", 1.0)]),
        };
        assert!(matches!(config.validate(), Err(AgentError::ConfigInvalid(_))));
    }
}
