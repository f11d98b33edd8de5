//! # Catalog Crate
//!
//! This crate owns the movie catalog the recommender samples from.
//!
//! ## Main Components
//!
//! - **types**: `Movie`, `Observation` (the state key and wire object), `MovieCatalog`
//! - **traits**: the `Catalog` capability (`random_entry`, `batch`, `by_id`)
//! - **parser**: parse MovieLens CSV files into rows
//! - **index**: join rows into a `MovieCatalog` and answer catalog queries
//! - **error**: error types for loading and lookups
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{Catalog, GenreMatch, MovieCatalog};
//! use std::path::Path;
//!
//! let catalog = MovieCatalog::load_from_dir(Path::new("data/ml-latest-small"))?;
//!
//! let first = catalog.random_entry()?;
//! let similar = catalog.batch(&first.genres, GenreMatch::Match, 32)?;
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod traits;
pub mod types;

pub use error::{CatalogError, Result};
pub use traits::Catalog;
pub use types::{GenreMatch, Movie, MovieCatalog, MovieId, Observation};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_creation() {
        let catalog = MovieCatalog::new();
        assert_eq!(catalog.counts(), (0, 0));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_insert_movie() {
        let mut catalog = MovieCatalog::new();
        catalog.insert_movie(Movie::new(1, 114709, "Toy Story (1995)", ["Animation", "Comedy"]));

        let retrieved = catalog.get_movie(1).unwrap();
        assert_eq!(retrieved.external_id, 114709);
        assert_eq!(catalog.get_movies_by_genre("Comedy"), &[1]);
        assert_eq!(catalog.genres(), vec!["Animation", "Comedy"]);
    }

    #[test]
    fn test_reinsert_replaces_row_and_genre_index() {
        let mut catalog = MovieCatalog::new();
        catalog.insert_movie(Movie::new(1, 0, "Old", ["Drama"]));
        catalog.insert_movie(Movie::new(1, 0, "New", ["Comedy"]));

        assert_eq!(catalog.counts().0, 1);
        assert_eq!(catalog.get_movie(1).unwrap().title, "New");
        assert!(catalog.get_movies_by_genre("Drama").is_empty());
    }

    #[test]
    fn test_observation_equality_is_field_by_field() {
        let a = Movie::new(7, 114709, "Toy Story", ["Animation", "Comedy"])
            .with_ratings(812.0, 201)
            .observation();
        let mut b = a.clone();
        assert_eq!(a, b);

        b.rating_count += 1;
        assert_ne!(a, b);

        let mut c = a.clone();
        c.genres.reverse();
        assert_ne!(a, c, "genres compare as a sequence");

        let set: HashSet<Observation> = [a.clone(), a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
