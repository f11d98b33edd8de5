//! The capability the episode layer needs from a movie store.

use crate::error::Result;
use crate::types::{GenreMatch, MovieId, Observation};

/// Read access to a movie catalog.
///
/// Implementations may sit in front of an external store, so every query
/// can fail; `MovieCatalog` is the in-memory implementation.
///
/// ## Design Note
/// `Send + Sync` lets one catalog be shared behind an `Arc` by the agent
/// and any number of tests or tools.
pub trait Catalog: Send + Sync {
    /// Pick one existing row uniformly at random.
    ///
    /// Fails with `NotFound` when the catalog is empty.
    fn random_entry(&self) -> Result<Observation>;

    /// Rows whose genres intersect (`Match`) or avoid (`Exclude`) `genres`,
    /// in random order, at most `limit` of them.
    ///
    /// Under-fill is not an error: when fewer rows qualify, all of them are
    /// returned (possibly none).
    fn batch(&self, genres: &[String], mode: GenreMatch, limit: usize) -> Result<Vec<Observation>>;

    /// Look a row up by id, failing with `NotFound` if absent.
    fn by_id(&self, id: MovieId) -> Result<Observation>;
}
