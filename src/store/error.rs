//! Errors surfaced by the storage collaborator.

use thiserror::Error;

/// Any way a storage call can fail. The transition controller treats every
/// variant the same way: the optimistic change is rolled back.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("remote call failed [{code}]: {message}")]
    Remote { code: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
