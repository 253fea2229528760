//! Error types for murmur-store

use thiserror::Error;

/// Result type alias using murmur-store Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to a store backend
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filter was not a field-equality object
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Update document had no supported operator
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// Document was not an object
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Requested item does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}
