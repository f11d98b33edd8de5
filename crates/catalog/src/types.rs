//! Core domain types for the movie catalog.
//!
//! - `Movie` is a catalog row, immutable once loaded.
//! - `Observation` is the six-field projection of a row that every catalog
//!   query returns. The learning agent uses it verbatim as its state key and
//!   the session server sends it to clients, so its serde layout *is* the
//!   wire layout.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a movie (MovieLens `movieId`)
pub type MovieId = u32;

// =============================================================================
// Movie
// =============================================================================

/// A single catalog row.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    /// IMDb id from `links.csv` (0 when the movie has no link row)
    pub external_id: u32,
    pub title: String,
    /// Genre names, kept sorted so the derived observation hashes
    /// deterministically
    pub genres: Vec<String>,
    /// Sum of every rating the movie received
    pub rating_sum: f64,
    /// Number of ratings the movie received
    pub rating_count: u32,
}

impl Movie {
    /// Create a movie, sorting and deduplicating its genres
    pub fn new(
        id: MovieId,
        external_id: u32,
        title: impl Into<String>,
        genres: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut genres: Vec<String> = genres.into_iter().map(Into::into).collect();
        genres.sort();
        genres.dedup();
        Self {
            id,
            external_id,
            title: title.into(),
            genres,
            rating_sum: 0.0,
            rating_count: 0,
        }
    }

    /// Builder-style setter for the rating aggregates
    pub fn with_ratings(mut self, rating_sum: f64, rating_count: u32) -> Self {
        self.rating_sum = rating_sum;
        self.rating_count = rating_count;
        self
    }

    /// True if this movie shares at least one genre with `genres`
    pub fn shares_genre(&self, genres: &[String]) -> bool {
        self.genres.iter().any(|g| genres.contains(g))
    }

    /// Project the row into the observation handed to the agent
    pub fn observation(&self) -> Observation {
        Observation {
            id: self.id,
            external_id: self.external_id,
            title: self.title.clone(),
            genres: self.genres.clone(),
            rating_sum: self.rating_sum,
            rating_count: self.rating_count,
        }
    }
}

// =============================================================================
// Observation
// =============================================================================

/// Six-field snapshot of a catalog row.
///
/// Field order matches the wire object: `id, imdbid, title, genres,
/// nratings, nusers`. Equality is field-by-field with genres compared as a
/// sequence, not as a set; `rating_sum` compares by bit pattern so the type
/// can be `Eq` and `Hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: MovieId,
    #[serde(rename = "imdbid")]
    pub external_id: u32,
    pub title: String,
    pub genres: Vec<String>,
    #[serde(rename = "nratings")]
    pub rating_sum: f64,
    #[serde(rename = "nusers")]
    pub rating_count: u32,
}

impl PartialEq for Observation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.external_id == other.external_id
            && self.title == other.title
            && self.genres == other.genres
            && self.rating_sum.to_bits() == other.rating_sum.to_bits()
            && self.rating_count == other.rating_count
    }
}

impl Eq for Observation {}

impl Hash for Observation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.external_id.hash(state);
        self.title.hash(state);
        self.genres.hash(state);
        self.rating_sum.to_bits().hash(state);
        self.rating_count.hash(state);
    }
}

impl From<&Movie> for Observation {
    fn from(movie: &Movie) -> Self {
        movie.observation()
    }
}

// =============================================================================
// Query modes
// =============================================================================

/// How `Catalog::batch` treats the requested genre set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenreMatch {
    /// Keep rows sharing at least one genre with the set
    Match,
    /// Keep rows sharing no genre with the set
    Exclude,
}

// =============================================================================
// MovieCatalog - The In-Memory Store
// =============================================================================

/// In-memory catalog holding every movie plus a genre index.
#[derive(Debug, Default)]
pub struct MovieCatalog {
    pub(crate) movies: HashMap<MovieId, Movie>,
    /// Every id, sorted, so random draws are uniform over existing rows
    pub(crate) ids: Vec<MovieId>,
    /// Movies grouped by genre (one movie can appear in multiple genre lists)
    pub(crate) genre_index: HashMap<String, Vec<MovieId>>,
}

impl MovieCatalog {
    /// Creates a new, empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog straight from rows
    pub fn from_movies(movies: impl IntoIterator<Item = Movie>) -> Self {
        let mut catalog = Self::new();
        for movie in movies {
            catalog.insert_movie(movie);
        }
        catalog
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Get all movies tagged with a genre
    pub fn get_movies_by_genre(&self, genre: &str) -> &[MovieId] {
        self.genre_index
            .get(genre)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every distinct genre name, sorted
    pub fn genres(&self) -> Vec<&str> {
        let mut genres: Vec<&str> = self.genre_index.keys().map(String::as_str).collect();
        genres.sort_unstable();
        genres
    }

    /// Insert a movie and update the indices.
    ///
    /// Re-inserting an id replaces the old row.
    pub fn insert_movie(&mut self, movie: Movie) {
        if let Some(old) = self.movies.remove(&movie.id) {
            for genre in &old.genres {
                if let Some(ids) = self.genre_index.get_mut(genre) {
                    ids.retain(|&id| id != old.id);
                }
            }
        } else {
            let pos = self.ids.partition_point(|&id| id < movie.id);
            self.ids.insert(pos, movie.id);
        }

        for genre in &movie.genres {
            self.genre_index
                .entry(genre.clone())
                .or_default()
                .push(movie.id);
        }
        self.movies.insert(movie.id, movie);
    }

    /// Number of movies and distinct genres, for logging
    pub fn counts(&self) -> (usize, usize) {
        (self.movies.len(), self.genre_index.len())
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}
