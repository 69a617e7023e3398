//! Error types for the library crate.

use thiserror::Error;

/// Errors that can occur while reading from or writing to a store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The relational store rejected or failed a query
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Snapshot file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot file was not valid JSON for the expected shape
    #[error("Failed to parse snapshot {path}: {reason}")]
    Snapshot { path: String, reason: String },

    /// A row referenced an entity that doesn't exist
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: String },

    /// A stored value was outside its allowed range
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, StoreError>;
