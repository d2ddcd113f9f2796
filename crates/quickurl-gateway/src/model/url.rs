use jiff::{SignedDuration, Timestamp};
use quickurl_core::{ListQuery, Token, UrlRecord, Visibility};
use quickurl_shortener::{ExpirationPolicy, ShortenParams};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Absolute expiry. Mutually exclusive with `ttl_seconds`.
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
    /// Caller-chosen token.
    #[serde(default)]
    pub token: Option<String>,
}

impl TryFrom<CreateUrlRequest> for ShortenParams {
    type Error = AppError;

    fn try_from(request: CreateUrlRequest) -> Result<Self, Self::Error> {
        let expiration = match (request.expires_at, request.ttl_seconds) {
            (Some(_), Some(_)) => {
                return Err(AppError::BadRequest(
                    "expires_at and ttl_seconds are mutually exclusive".to_string(),
                ))
            }
            (Some(at), None) => ExpirationPolicy::AtTimestamp(at),
            (None, Some(secs)) => ExpirationPolicy::AfterDuration(SignedDuration::from_secs(secs)),
            (None, None) => ExpirationPolicy::Default,
        };

        let custom_token = request
            .token
            .map(Token::new)
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(ShortenParams {
            original_url: request.url,
            title: request.title,
            expiration,
            custom_token,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub id: String,
    pub token: String,
    pub original_url: String,
    pub short_url: String,
    pub title: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub click_count: u64,
}

impl UrlResponse {
    pub fn new(record: UrlRecord, short_url: String) -> Self {
        Self {
            id: record.id.to_string(),
            token: record.token.into(),
            original_url: record.original_url,
            short_url,
            title: record.title,
            created_at: record.created_at,
            expires_at: record.expires_at,
            click_count: record.click_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListUrlsResponse {
    pub urls: Vec<UrlResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUrlsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    #[serde(default)]
    pub include_expired: bool,
}

impl From<ListUrlsQuery> for ListQuery {
    fn from(query: ListUrlsQuery) -> Self {
        let visibility = if query.include_expired {
            Visibility::Any
        } else {
            Visibility::Live
        };

        ListQuery::builder()
            .visibility(visibility)
            .limit(query.limit.unwrap_or(ListQuery::DEFAULT_LIMIT))
            .offset(query.offset.unwrap_or_default())
            .build()
    }
}
