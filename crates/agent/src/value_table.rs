//! Tabular action values keyed by observation.
//!
//! Unseen `(observation, action)` pairs read as `0.0`. Reads never insert;
//! writes go through `entry`, which inserts a zeroed row on first use.
//!
//! The table has no eviction and grows by one row per distinct observation
//! the agent learns about. The catalog is finite, so the size is bounded by
//! the number of movies.

use crate::error::{AgentError, Result};
use catalog::Observation;
use environment::Action;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use tracing::{info, warn};

/// Values for `[Upvote, Downvote]`
pub type ActionValues = [f64; 2];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    values: HashMap<Observation, ActionValues>,
}

/// On-disk form of one table row
#[derive(Debug, Serialize, Deserialize)]
struct ValueRecord {
    observation: Observation,
    upvote: f64,
    downvote: f64,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current estimate for `(observation, action)`, `0.0` if unseen
    pub fn value(&self, observation: &Observation, action: Action) -> f64 {
        self.values
            .get(observation)
            .map(|values| values[action.index()])
            .unwrap_or(0.0)
    }

    /// Get-or-insert-default access to a row
    pub fn entry(&mut self, observation: &Observation) -> &mut ActionValues {
        self.values.entry(observation.clone()).or_insert([0.0; 2])
    }

    /// Larger of the two action values (0.0 for an unseen observation)
    pub fn max_value(&self, observation: &Observation) -> f64 {
        Action::ALL
            .iter()
            .map(|&a| self.value(observation, a))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Greedy action; ties go to `Upvote`
    pub fn best_action(&self, observation: &Observation) -> Action {
        if self.value(observation, Action::Upvote) >= self.value(observation, Action::Downvote) {
            Action::Upvote
        } else {
            Action::Downvote
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Rows sorted by their best value, highest first
    pub fn top(&self, k: usize) -> Vec<(&Observation, ActionValues)> {
        let mut rows: Vec<(&Observation, ActionValues)> =
            self.values.iter().map(|(obs, values)| (obs, *values)).collect();
        rows.sort_by(|a, b| {
            let best_a = a.1[0].max(a.1[1]);
            let best_b = b.1[0].max(b.1[1]);
            best_b
                .partial_cmp(&best_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows.truncate(k);
        rows
    }

    /// Write the table as a JSON list of records
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| AgentError::Persistence {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let file = File::create(path).map_err(|source| AgentError::Persistence {
            path: path.display().to_string(),
            source,
        })?;

        let records: Vec<ValueRecord> = self
            .values
            .iter()
            .map(|(observation, values)| ValueRecord {
                observation: observation.clone(),
                upvote: values[Action::Upvote.index()],
                downvote: values[Action::Downvote.index()],
            })
            .collect();
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &records)?;
        writer.flush().map_err(|source| AgentError::Persistence {
            path: path.display().to_string(),
            source,
        })?;

        info!("Saved {} value table rows to {}", records.len(), path.display());
        Ok(())
    }

    /// Read a table written by `save`
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| AgentError::Persistence {
            path: path.display().to_string(),
            source,
        })?;
        let records: Vec<ValueRecord> = serde_json::from_reader(BufReader::new(file))?;

        let mut table = Self::new();
        for record in records {
            let mut values = [0.0; 2];
            values[Action::Upvote.index()] = record.upvote;
            values[Action::Downvote.index()] = record.downvote;
            table.values.insert(record.observation, values);
        }
        info!("Loaded {} value table rows from {}", table.len(), path.display());
        Ok(table)
    }

    /// Like `load`, but a missing file gives an empty table
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(AgentError::Persistence { source, .. }) if source.kind() == ErrorKind::NotFound => {
                warn!("No value table at {}, starting empty", path.display());
                Ok(Self::new())
            }
            other => other,
        }
    }
}
