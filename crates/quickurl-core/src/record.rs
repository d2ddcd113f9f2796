use crate::error::{Result, StoreError};
use crate::token::Token;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use typed_builder::TypedBuilder;

/// Opaque, immutable primary key of a [`UrlRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random (UUID v4) identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored shortened URL.
///
/// Liveness is never stored: it is derived from `expires_at` against the
/// caller's notion of "now" via [`UrlRecord::is_live_at`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub id: RecordId,
    pub token: Token,
    /// The redirect target.
    pub original_url: String,
    pub title: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub click_count: u64,
}

impl UrlRecord {
    /// Builds the record a store inserts for `new`, created at `now`.
    ///
    /// Timestamps are truncated to whole milliseconds so every backend
    /// stores and returns identical values.
    pub fn from_new(new: NewUrl, id: RecordId, now: Timestamp) -> Result<Self> {
        new.validate()?;

        let created_at = truncate_to_millis(now)
            .map_err(|e| StoreError::InvalidData(format!("clock out of range: {e}")))?;
        let expires_at = match new.expiry {
            Expiry::Ttl(ttl) => created_at
                .checked_add(ttl)
                .and_then(truncate_to_millis)
                .map_err(|e| StoreError::InvalidInput(format!("ttl out of range: {e}")))?,
            Expiry::At(at) => truncate_to_millis(at)
                .map_err(|e| StoreError::InvalidInput(format!("expiry out of range: {e}")))?,
        };

        if expires_at <= created_at {
            return Err(StoreError::InvalidInput(format!(
                "expiry must be at least one millisecond after creation, got {}",
                new.expiry
            )));
        }

        Ok(Self {
            id,
            token: new.token,
            original_url: new.original_url,
            title: new.title,
            created_at,
            expires_at,
            click_count: 0,
        })
    }

    /// A record is live strictly before its expiry instant.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        !self.is_live_at(now)
    }

    /// Whether the record is returned to a caller using `visibility`.
    pub fn is_visible(&self, visibility: Visibility, now: Timestamp) -> bool {
        match visibility {
            Visibility::Live => self.is_live_at(now),
            Visibility::Any => true,
        }
    }
}

fn truncate_to_millis(ts: Timestamp) -> std::result::Result<Timestamp, jiff::Error> {
    Timestamp::from_millisecond(ts.as_millisecond())
}

/// Parameters for creating a record.
#[derive(Debug, Clone, TypedBuilder)]
pub struct NewUrl {
    pub token: Token,
    /// The redirect target. Must not be empty.
    #[builder(setter(into))]
    pub original_url: String,
    #[builder(default, setter(strip_option(fallback = title_opt)))]
    pub title: Option<String>,
    /// When the record stops being live. Accepts a [`SignedDuration`] (a
    /// TTL measured from creation) or a [`Timestamp`].
    #[builder(setter(into))]
    pub expiry: Expiry,
}

/// Expiry of a new record.
///
/// The store resolves it against the same `now` it stamps as `created_at`,
/// so an absolute instant is stored exactly as requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Time to live, measured from creation. Must be positive.
    Ttl(SignedDuration),
    /// Absolute instant. Must be later than the creation time.
    At(Timestamp),
}

impl From<SignedDuration> for Expiry {
    fn from(ttl: SignedDuration) -> Self {
        Self::Ttl(ttl)
    }
}

impl From<Timestamp> for Expiry {
    fn from(at: Timestamp) -> Self {
        Self::At(at)
    }
}

impl Display for Expiry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ttl(ttl) => write!(f, "ttl {ttl}"),
            Self::At(at) => write!(f, "at {at}"),
        }
    }
}

impl NewUrl {
    pub fn validate(&self) -> Result<()> {
        if self.original_url.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "original_url cannot be empty".to_string(),
            ));
        }

        if let Expiry::Ttl(ttl) = self.expiry {
            if !ttl.is_positive() {
                return Err(StoreError::InvalidInput(format!(
                    "ttl must be positive, got {ttl}"
                )));
            }
        }

        Ok(())
    }
}

/// Which records a lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Public view: expired records are treated as deleted.
    #[default]
    Live,
    /// Administrative view: any physically present record.
    Any,
}

/// A page of records ordered by creation time, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct ListQuery {
    #[builder(default)]
    pub visibility: Visibility,
    #[builder(default = ListQuery::DEFAULT_LIMIT)]
    pub limit: usize,
    #[builder(default = 0)]
    pub offset: usize,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: usize = 100;
    pub const MAX_LIMIT: usize = 1_000;

    /// The effective page size, clamped to `1..=MAX_LIMIT`.
    pub fn page_size(&self) -> usize {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::builder().build()
    }
}
