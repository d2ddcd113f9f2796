use crate::error::Result;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use quickurl_core::{ListQuery, Token, UrlRecord};
use serde::{Deserialize, Serialize};

/// Expiration policy for a shortened URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExpirationPolicy {
    /// Use the service's default time to live.
    #[default]
    Default,
    /// The shortened URL expires after a certain duration.
    AfterDuration(SignedDuration),
    /// The shortened URL expires at a specific timestamp.
    AtTimestamp(Timestamp),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    pub title: Option<String>,
    /// The expiration policy for the shortened URL.
    pub expiration: ExpirationPolicy,
    /// Optional caller-chosen token.
    pub custom_token: Option<Token>,
}

impl ShortenParams {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            title: None,
            expiration: ExpirationPolicy::Default,
            custom_token: None,
        }
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Stores a new shortened URL and returns the created record.
    async fn shorten(&self, params: ShortenParams) -> Result<UrlRecord>;

    /// Follows a token: counts a click on a live record and returns it with
    /// the updated count.
    async fn resolve(&self, token: &Token) -> Result<UrlRecord>;

    /// Returns the record for `token`, expired or not.
    async fn info(&self, token: &Token) -> Result<UrlRecord>;

    /// Lists records, newest first.
    async fn list(&self, query: ListQuery) -> Result<Vec<UrlRecord>>;

    /// Removes the record for `token`, expired or not.
    async fn delete(&self, token: &Token) -> Result<()>;

    /// Physically removes every expired record. Returns how many were removed.
    async fn purge_expired(&self) -> Result<u64>;
}
