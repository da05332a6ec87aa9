//! Error types for the ORM system
//!
//! Not-found outcomes are not errors anywhere in this crate: lookups that
//! match no row return `None`/empty collections. Errors are reserved for
//! configuration mistakes, missing identifiers, and database failures,
//! which propagate to the caller unchanged.

use std::fmt;

/// Result type alias for ORM operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for ORM operations
#[derive(Debug, Clone)]
pub enum OrmError {
    /// Database connection or statement failure, passed through as-is
    Database(String),
    /// Operating on a class/entity with invalid or missing metadata
    Configuration(String),
    /// Relationship resolution failed
    Relationship(String),
    /// Query building error
    Query(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// The instance carries no usable identifier value
    MissingIdentifier,
}

impl fmt::Display for OrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrmError::Database(msg) => write!(f, "Database error: {}", msg),
            OrmError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            OrmError::Relationship(msg) => write!(f, "Relationship error: {}", msg),
            OrmError::Query(msg) => write!(f, "Query error: {}", msg),
            OrmError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            OrmError::MissingIdentifier => write!(f, "Identifier value is missing or empty"),
        }
    }
}

impl std::error::Error for OrmError {}

// Convert from sqlx errors
impl From<sqlx::Error> for OrmError {
    fn from(err: sqlx::Error) -> Self {
        OrmError::Database(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        OrmError::Serialization(err.to_string())
    }
}
