//! Parser for MovieLens CSV files.
//!
//! This module handles the three files the catalog is built from:
//! - links.csv: movieId,imdbId,tmdbId
//! - movies.csv: movieId,title,genres
//! - ratings.csv: userId,movieId,rating,timestamp
//!
//! Every file starts with a header line, which is skipped. Titles may be
//! double-quoted when they contain commas, with `""` standing for a literal
//! quote.

use crate::error::{CatalogError, Result};
use crate::types::MovieId;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One row of links.csv
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRow {
    pub movie_id: MovieId,
    pub imdb_id: u32,
}

/// One row of movies.csv
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRow {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
}

/// One row of ratings.csv (the user and timestamp are not needed)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRow {
    pub movie_id: MovieId,
    pub rating: f64,
}

/// Read a file into lines, replacing invalid UTF-8 instead of failing.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content = String::from_utf8_lossy(&bytes);
    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Split one CSV line into fields, honouring double quotes.
pub(crate) fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Walk the data lines of a file (header and blanks skipped), handing each
/// split record to `parse_row` together with its 1-based line number.
fn parse_records<T>(
    path: &Path,
    file_name: &str,
    expected: usize,
    mut parse_row: impl FnMut(&[String], usize) -> Result<T>,
) -> Result<Vec<T>> {
    let lines = read_lines(path)?;
    let mut rows = Vec::with_capacity(lines.len().saturating_sub(1));

    for (idx, line) in lines.iter().enumerate().skip(1) {
        let line_no = idx + 1;
        let line_trimmed = line.trim_end_matches('\r');
        if line_trimmed.trim().is_empty() {
            continue;
        }

        let fields = split_csv_line(line_trimmed);
        if fields.len() != expected {
            return Err(CatalogError::FieldCountMismatch {
                file: file_name.to_string(),
                expected,
                found: fields.len(),
                line: line_no,
            });
        }
        rows.push(parse_row(&fields, line_no)?);
    }
    Ok(rows)
}

fn parse_field<T>(value: &str, file: &str, line: usize, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| CatalogError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}

/// Parse the links.csv file
///
/// Format: movieId,imdbId,tmdbId
///
/// imdbId keeps its leading zeros in the file ("0114709"); they are dropped
/// when parsed as a number. tmdbId is ignored and may be empty.
pub fn parse_links(path: &Path) -> Result<Vec<LinkRow>> {
    parse_records(path, "links.csv", 3, |fields, line_no| {
        Ok(LinkRow {
            movie_id: parse_field(&fields[0], "links.csv", line_no, "movieId")?,
            imdb_id: parse_field(&fields[1], "links.csv", line_no, "imdbId")?,
        })
    })
}

/// Parse the movies.csv file
///
/// Format: movieId,title,genres
///
/// Genres are pipe-separated: "Animation|Children|Comedy"
pub fn parse_movies(path: &Path) -> Result<Vec<MovieRow>> {
    parse_records(path, "movies.csv", 3, |fields, line_no| {
        Ok(MovieRow {
            movie_id: parse_field(&fields[0], "movies.csv", line_no, "movieId")?,
            title: fields[1].trim_end().to_string(),
            genres: parse_genres(&fields[2]),
        })
    })
}

/// Parse the ratings.csv file
///
/// Format: userId,movieId,rating,timestamp
pub fn parse_ratings(path: &Path) -> Result<Vec<RatingRow>> {
    parse_records(path, "ratings.csv", 4, |fields, line_no| {
        let rating: f64 = parse_field(&fields[2], "ratings.csv", line_no, "rating")?;
        // NaN and inf parse as f64 but have no JSON form
        if !rating.is_finite() {
            return Err(CatalogError::ParseError {
                file: "ratings.csv".to_string(),
                line: line_no,
                reason: format!("Invalid rating: {} is not a finite number", fields[2].trim()),
            });
        }
        Ok(RatingRow {
            movie_id: parse_field(&fields[1], "ratings.csv", line_no, "movieId")?,
            rating,
        })
    })
}

/// Parse pipe-separated genres
///
/// Example: "Action|Adventure|Sci-Fi" -> ["Action", "Adventure", "Sci-Fi"]
fn parse_genres(s: &str) -> Vec<String> {
    s.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_split_plain_line() {
        assert_eq!(split_csv_line("1,2,3"), vec!["1", "2", "3"]);
        assert_eq!(split_csv_line("1,,3"), vec!["1", "", "3"]);
    }

    #[test]
    fn test_split_quoted_title() {
        let fields = split_csv_line(r#"11,"American President, The (1995)",Comedy|Drama|Romance"#);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1], "American President, The (1995)");

        let fields = split_csv_line(r#"5,"Say ""Hi"" (2001)",Comedy"#);
        assert_eq!(fields[1], r#"Say "Hi" (2001)"#);
    }

    #[test]
    fn test_parse_genres() {
        assert_eq!(parse_genres("Action|Sci-Fi"), vec!["Action", "Sci-Fi"]);
        assert_eq!(parse_genres("(no genres listed)"), vec!["(no genres listed)"]);
    }

    #[test]
    fn test_parse_movies_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "movies.csv",
            "movieId,title,genres\n1,Toy Story (1995)  ,Animation|Comedy\n\n2,\"Jumanji, The (1995)\",Adventure\n",
        );

        let movies = parse_movies(&path).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Toy Story (1995)");
        assert_eq!(movies[0].genres, vec!["Animation", "Comedy"]);
        assert_eq!(movies[1].title, "Jumanji, The (1995)");
    }

    #[test]
    fn test_parse_links_drops_leading_zeros() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "links.csv", "movieId,imdbId,tmdbId\n1,0114709,862\n2,0113497,\n");

        let links = parse_links(&path).unwrap();
        assert_eq!(links[0], LinkRow { movie_id: 1, imdb_id: 114709 });
        assert_eq!(links[1].imdb_id, 113497);
    }

    #[test]
    fn test_field_count_mismatch_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "ratings.csv",
            "userId,movieId,rating,timestamp\n1,1,4.0,964982703\n1,3,4.0\n",
        );

        let err = parse_ratings(&path).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::FieldCountMismatch { expected: 4, found: 3, line: 3, .. }
        ));
    }

    #[test]
    fn test_invalid_number_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "ratings.csv", "userId,movieId,rating,timestamp\n1,abc,4.0,1\n");

        let err = parse_ratings(&path).unwrap_err();
        assert!(matches!(err, CatalogError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_non_finite_rating_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        for rating in ["NaN", "inf", "-inf"] {
            let content = format!("userId,movieId,rating,timestamp\n1,1,4.0,1\n1,2,{},1\n", rating);
            let path = write_file(dir.path(), "ratings.csv", &content);

            let err = parse_ratings(&path).unwrap_err();
            assert!(
                matches!(err, CatalogError::ParseError { line: 3, .. }),
                "accepted rating {}",
                rating
            );
        }
    }
}
