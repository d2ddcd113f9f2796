use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("token prefix may only contain letters, digits, '-' or '_': {0:?}")]
    InvalidPrefix(String),
    #[error("token prefix {prefix:?} is longer than {max} characters")]
    PrefixTooLong { prefix: String, max: usize },
}
