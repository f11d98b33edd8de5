//! Error types for the environment crate.

use catalog::{CatalogError, GenreMatch};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// A refill found no candidates; the episode is aborted
    #[error("Empty batch: no movies for {mode:?} {genres:?}")]
    EmptyBatch { genres: Vec<String>, mode: GenreMatch },

    /// `step` was called before the first `reset`
    #[error("No episode in progress: reset() must be called before step()")]
    NotStarted,

    #[error("Invalid environment configuration: {0}")]
    ConfigInvalid(String),

    /// Lookup or store failure, including `NotFound` from `reset`
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl EnvironmentError {
    /// True when the catalog had nothing to return for a lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, EnvironmentError::Catalog(CatalogError::NotFound(_)))
    }
}

pub type Result<T> = std::result::Result<T, EnvironmentError>;
