//! Error types for the retrieval system.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval system.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding provider error.
    #[error("embedding error: {0}")]
    Embedding(#[from] agenda_embeddings::EmbeddingError),

    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Missing or malformed input.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Vector length does not match the store's configured dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
