use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("token already exists: {0}")]
    DuplicateToken(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Whether a caller may reasonably retry the failed operation.
    ///
    /// The store itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}
