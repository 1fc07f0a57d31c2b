//! Storage error types

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`StressTestStore`](crate::StressTestStore)
#[derive(Error, Debug)]
pub enum StoreError {
    /// Entity not found
    #[error("{0} not found")]
    NotFound(String),

    /// The entity is not acceptable for storage
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Uniqueness or state constraint violated
    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
