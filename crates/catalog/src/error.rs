//! Error types for the catalog crate.
//!
//! Covers both sides of the catalog: loading the MovieLens CSV files and
//! answering lookups once the catalog is built.

use thiserror::Error;

/// Errors that can occur while loading or querying the catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No row matches the lookup; the string says which one
    ///
    /// `random_entry` on an empty catalog reports this too, since there is
    /// no valid id range to draw from.
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error occurred while reading a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in a data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// Expected number of fields in a line doesn't match actual
    #[error("Expected {expected} fields but found {found} in line {line} of {file}")]
    FieldCountMismatch {
        file: String,
        expected: usize,
        found: usize,
        line: usize,
    },

    /// Referenced entity doesn't exist (e.g., rating for non-existent movie)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u32 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
