//! Error types for label storage.

use thiserror::Error;

/// Errors surfaced by label store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("component version {0} not found")]
    VersionNotFound(String),

    #[error("label {name} of {version} is malformed: {reason}")]
    MalformedLabel {
        version: String,
        name: String,
        reason: String,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
