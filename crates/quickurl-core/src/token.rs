use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A validated public lookup key for a shortened URL.
///
/// Tokens must be 1-64 characters long and contain only
/// alphanumeric characters, hyphens, or underscores.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

const MIN_LENGTH: usize = 1;
const MAX_LENGTH: usize = 64;

impl Token {
    /// Longest accepted token.
    pub const MAX_LEN: usize = MAX_LENGTH;

    /// Creates a new `Token` after validating the input.
    ///
    /// Valid tokens are 1-64 characters and contain only `[a-zA-Z0-9_-]`.
    pub fn new(token: impl Into<String>) -> Result<Self, StoreError> {
        let token = token.into();
        Self::validate(&token)?;
        Ok(Self(token))
    }

    /// Creates a `Token` without validation.
    ///
    /// Use this only for tokens produced by trusted internal sources
    /// (e.g. generators or rows read back from storage).
    pub fn new_unchecked(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Whether `c` may appear in a token.
    pub fn is_token_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(token: &str) -> Result<(), StoreError> {
        if token.len() < MIN_LENGTH || token.len() > MAX_LENGTH {
            return Err(StoreError::InvalidInput(format!(
                "token length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_LENGTH,
                token.len()
            )));
        }

        if !token.chars().all(Self::is_token_char) {
            return Err(StoreError::InvalidInput(format!(
                "token must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                token
            )));
        }

        Ok(())
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Token {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_tokens() {
        assert!(Token::new("x").is_ok());
        assert!(Token::new("abc123").is_ok());
        assert!(Token::new("Abc-123_xyz").is_ok());
        assert!(Token::new("a".repeat(64)).is_ok());
    }

    #[test]
    fn empty_token() {
        let err = Token::new("").unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn too_long() {
        assert!(Token::new("a".repeat(65)).is_err());
    }

    #[test]
    fn invalid_characters() {
        assert!(Token::new("abc def").is_err());
        assert!(Token::new("abc/def").is_err());
        assert!(Token::new("abc!def").is_err());
    }

    #[test]
    fn display() {
        let token = Token::new("my-token").unwrap();
        assert_eq!(token.to_string(), "my-token");
    }

    #[test]
    fn to_url() {
        let token = Token::new("abc123").unwrap();
        assert_eq!(token.to_url("http://localhost:3000"), "http://localhost:3000/abc123");
        assert_eq!(token.to_url("http://localhost:3000/"), "http://localhost:3000/abc123");
    }

    #[test]
    fn deserialize_validates() {
        let ok: Token = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(ok.as_str(), "abc123");

        assert!(serde_json::from_str::<Token>("\"no spaces\"").is_err());
    }
}
