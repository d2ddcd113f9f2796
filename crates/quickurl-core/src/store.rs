use crate::error::Result;
use crate::record::{ListQuery, NewUrl, RecordId, UrlRecord, Visibility};
use crate::token::Token;
use async_trait::async_trait;
use jiff::Timestamp;

/// A read-only view of a URL record store.
///
/// Lookups honour a [`Visibility`]: with [`Visibility::Live`] an expired
/// record is reported as `NotFound` even if it has not been swept yet.
#[async_trait]
pub trait ReadStore: Send + Sync + 'static {
    /// Point lookup on the token index.
    async fn lookup_by_token(&self, token: &Token, visibility: Visibility) -> Result<UrlRecord>;

    /// Point lookup on the primary key.
    async fn lookup_by_id(&self, id: &RecordId, visibility: Visibility) -> Result<UrlRecord>;

    /// Lists records newest first, walking the creation-time index.
    async fn list(&self, query: ListQuery) -> Result<Vec<UrlRecord>>;
}

#[async_trait]
pub trait UrlStore: ReadStore {
    /// Inserts a new record with a freshly generated id.
    ///
    /// The token uniqueness check is atomic with the insert. Returns
    /// `Err(DuplicateToken)` if any stored record, live or expired, holds the
    /// token, and `Err(InvalidInput)` for an empty URL or non-positive TTL.
    async fn create(&self, new: NewUrl) -> Result<UrlRecord>;

    /// Atomically adds one click to the live record holding `token` and
    /// returns the record as updated, so a sweep racing the redirect cannot
    /// lose a counted click.
    ///
    /// Returns `Err(NotFound)` if no live record holds the token.
    async fn record_click(&self, token: &Token) -> Result<UrlRecord>;

    /// Like [`UrlStore::record_click`], returning only the updated count.
    async fn increment_clicks(&self, token: &Token) -> Result<u64> {
        Ok(self.record_click(token).await?.click_count)
    }

    /// Removes every record with `expires_at <= now` and returns how many
    /// were removed. Records expiring after `now` are never touched.
    async fn sweep(&self, now: Timestamp) -> Result<u64>;

    /// Removes the record with the given id regardless of expiry.
    async fn delete(&self, id: &RecordId) -> Result<()>;
}
