//! Catalog building and sampling.
//!
//! Builds a `MovieCatalog` from the parsed CSV rows (joining links, titles
//! and rating aggregates per movie) and implements the `Catalog` queries
//! on top of the in-memory indices.

use crate::error::{CatalogError, Result};
use crate::parser::{self, LinkRow, MovieRow, RatingRow};
use crate::traits::Catalog;
use crate::types::*;
use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

impl MovieCatalog {
    /// Load the catalog from a MovieLens directory
    ///
    /// Steps:
    /// 1. Parse links, movies and ratings (in parallel)
    /// 2. Join them into one row per movie
    /// 3. Build the id and genre indices
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading movie catalog from {:?}", data_dir);

        let links_path = data_dir.join("links.csv");
        let movies_path = data_dir.join("movies.csv");
        let ratings_path = data_dir.join("ratings.csv");

        // Three-way parallelism from nested joins
        let ((links, movies), ratings) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_links(&links_path),
                    || parser::parse_movies(&movies_path),
                )
            },
            || parser::parse_ratings(&ratings_path),
        );

        let links = links?;
        let movies = movies?;
        let ratings = ratings?;

        info!(
            "Parsed {} links, {} movies, {} ratings",
            links.len(),
            movies.len(),
            ratings.len()
        );

        let catalog = Self::from_rows(links, movies, ratings)?;
        let (movie_count, genre_count) = catalog.counts();
        info!("Catalog built: {} movies across {} genres", movie_count, genre_count);
        Ok(catalog)
    }

    /// Join parsed rows into a catalog.
    ///
    /// A movie without a link row gets `external_id = 0`; a rating for a
    /// movie missing from movies.csv is a `MissingReference`.
    pub fn from_rows(
        links: Vec<LinkRow>,
        movies: Vec<MovieRow>,
        ratings: Vec<RatingRow>,
    ) -> Result<Self> {
        let imdb_ids: HashMap<MovieId, u32> = links
            .into_iter()
            .map(|link| (link.movie_id, link.imdb_id))
            .collect();

        let mut rows: HashMap<MovieId, Movie> = movies
            .into_iter()
            .map(|row| {
                let external_id = imdb_ids.get(&row.movie_id).copied().unwrap_or_else(|| {
                    debug!("Movie {} has no link row", row.movie_id);
                    0
                });
                (row.movie_id, Movie::new(row.movie_id, external_id, row.title, row.genres))
            })
            .collect();

        for rating in ratings {
            let movie = rows
                .get_mut(&rating.movie_id)
                .ok_or_else(|| CatalogError::MissingReference {
                    entity: "Movie".to_string(),
                    id: rating.movie_id,
                })?;
            movie.rating_sum += rating.rating;
            movie.rating_count += 1;
        }

        Ok(Self::from_movies(rows.into_values()))
    }

    fn candidates_for(&self, genres: &[String], mode: GenreMatch) -> Vec<MovieId> {
        match mode {
            GenreMatch::Match => {
                let mut seen = HashSet::new();
                genres
                    .iter()
                    .flat_map(|genre| self.get_movies_by_genre(genre))
                    .copied()
                    .filter(|id| seen.insert(*id))
                    .collect()
            }
            GenreMatch::Exclude => self
                .movies
                .par_iter()
                .filter(|(_, movie)| !movie.shares_genre(genres))
                .map(|(&id, _)| id)
                .collect(),
        }
    }

    fn lookup(&self, id: MovieId) -> Result<Observation> {
        self.get_movie(id)
            .map(Movie::observation)
            .ok_or_else(|| CatalogError::NotFound(format!("movie {}", id)))
    }
}

impl Catalog for MovieCatalog {
    fn random_entry(&self) -> Result<Observation> {
        if self.ids.is_empty() {
            return Err(CatalogError::NotFound("any movie (catalog is empty)".to_string()));
        }
        let idx = rand::rng().random_range(0..self.ids.len());
        self.lookup(self.ids[idx])
    }

    fn batch(&self, genres: &[String], mode: GenreMatch, limit: usize) -> Result<Vec<Observation>> {
        let mut candidates = self.candidates_for(genres, mode);
        let qualifying = candidates.len();

        let (picked, _) = candidates.partial_shuffle(&mut rand::rng(), limit);
        let batch = picked
            .iter()
            .map(|&id| self.lookup(id))
            .collect::<Result<Vec<_>>>()?;

        if batch.len() < limit {
            debug!(
                "Batch under-filled: {} of {} requested ({:?} {:?})",
                batch.len(),
                limit,
                mode,
                genres
            );
        }
        if qualifying == 0 {
            warn!("No movies qualify for {:?} {:?}", mode, genres);
        }
        Ok(batch)
    }

    fn by_id(&self, id: MovieId) -> Result<Observation> {
        self.lookup(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_catalog() -> MovieCatalog {
        MovieCatalog::from_movies(vec![
            Movie::new(1, 114709, "Toy Story (1995)", ["Comedy", "Animation"]),
            Movie::new(2, 113497, "Jumanji (1995)", ["Adventure", "Fantasy"]),
            Movie::new(3, 113228, "Grumpier Old Men (1995)", ["Comedy", "Romance"]),
            Movie::new(4, 114885, "Waiting to Exhale (1995)", ["Drama", "Romance"]),
            Movie::new(5, 113041, "Heat (1995)", ["Action", "Crime"]),
        ])
    }

    fn genres(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_genres_are_sorted_on_insert() {
        let catalog = create_test_catalog();
        assert_eq!(catalog.get_movie(1).unwrap().genres, vec!["Animation", "Comedy"]);
    }

    #[test]
    fn test_random_entry_returns_existing_row() {
        let catalog = create_test_catalog();
        for _ in 0..50 {
            let obs = catalog.random_entry().unwrap();
            assert!(catalog.get_movie(obs.id).is_some());
        }
    }

    #[test]
    fn test_random_entry_on_empty_catalog_is_not_found() {
        let catalog = MovieCatalog::new();
        assert!(matches!(catalog.random_entry(), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_by_id() {
        let catalog = create_test_catalog();
        let obs = catalog.by_id(5).unwrap();
        assert_eq!(obs.title, "Heat (1995)");
        assert!(matches!(catalog.by_id(999), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_batch_match_keeps_intersecting_rows() {
        let catalog = create_test_catalog();
        let batch = catalog.batch(&genres(&["Comedy"]), GenreMatch::Match, 10).unwrap();

        let mut ids: Vec<MovieId> = batch.iter().map(|o| o.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_batch_match_does_not_duplicate_multi_genre_rows() {
        let catalog = create_test_catalog();
        let batch = catalog
            .batch(&genres(&["Comedy", "Romance"]), GenreMatch::Match, 10)
            .unwrap();

        let mut ids: Vec<MovieId> = batch.iter().map(|o| o.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_batch_exclude_keeps_disjoint_rows() {
        let catalog = create_test_catalog();
        let batch = catalog
            .batch(&genres(&["Comedy", "Romance"]), GenreMatch::Exclude, 10)
            .unwrap();

        let mut ids: Vec<MovieId> = batch.iter().map(|o| o.id).collect();
        ids.sort();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn test_batch_truncates_to_limit() {
        let catalog = create_test_catalog();
        let batch = catalog.batch(&genres(&["Drama"]), GenreMatch::Exclude, 2).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|o| !o.genres.contains(&"Drama".to_string())));
    }

    #[test]
    fn test_batch_with_no_candidates_is_empty_not_error() {
        let catalog = create_test_catalog();
        let batch = catalog.batch(&genres(&["Western"]), GenreMatch::Match, 3).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_from_rows_aggregates_ratings() {
        let links = vec![LinkRow { movie_id: 1, imdb_id: 114709 }];
        let movies = vec![
            MovieRow { movie_id: 1, title: "Toy Story (1995)".into(), genres: genres(&["Comedy", "Animation"]) },
            MovieRow { movie_id: 2, title: "Jumanji (1995)".into(), genres: genres(&["Adventure"]) },
        ];
        let ratings = vec![
            RatingRow { movie_id: 1, rating: 4.0 },
            RatingRow { movie_id: 1, rating: 3.5 },
        ];

        let catalog = MovieCatalog::from_rows(links, movies, ratings).unwrap();
        let toy_story = catalog.get_movie(1).unwrap();
        assert_eq!(toy_story.rating_sum, 7.5);
        assert_eq!(toy_story.rating_count, 2);
        assert_eq!(toy_story.external_id, 114709);
        assert_eq!(catalog.get_movie(2).unwrap().external_id, 0);
    }

    #[test]
    fn test_from_rows_rejects_dangling_rating() {
        let ratings = vec![RatingRow { movie_id: 42, rating: 4.0 }];
        let err = MovieCatalog::from_rows(vec![], vec![], ratings).unwrap_err();
        assert!(matches!(err, CatalogError::MissingReference { id: 42, .. }));
    }
}
