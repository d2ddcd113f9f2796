use quickurl_core::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortenerError {
    #[error("token already exists: {0}")]
    TokenConflict(String),
    #[error("no free token after {attempts} attempts")]
    TokenExhausted { attempts: u32 },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("url not found: {0}")]
    NotFound(String),
    #[error("url has expired: {0}")]
    Expired(String),
    #[error(transparent)]
    Storage(StoreError),
}

impl ShortenerError {
    /// Whether the failure is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ShortenerError::TokenExhausted { .. } => true,
            ShortenerError::Storage(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<StoreError> for ShortenerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateToken(token) => Self::TokenConflict(token),
            StoreError::InvalidInput(message) => Self::InvalidInput(message),
            StoreError::NotFound(key) => Self::NotFound(key),
            other => Self::Storage(other),
        }
    }
}
