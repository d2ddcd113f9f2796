use crate::error::{Result, ShortenerError};
use crate::shortener::{ExpirationPolicy, ShortenParams, Shortener};
use async_trait::async_trait;
use jiff::SignedDuration;
use quickurl_core::{
    Clock, Expiry, ListQuery, NewUrl, StoreError, SystemClock, Token, UrlRecord, UrlStore, Visibility,
};
use quickurl_generator::Generator;
use std::sync::Arc;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_TTL: SignedDuration = SignedDuration::from_hours(30 * 24);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct ShortenerSettings {
    /// Time to live for `ExpirationPolicy::Default`.
    #[builder(default = DEFAULT_TTL)]
    pub default_ttl: SignedDuration,
    /// How many generated tokens to try before giving up.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `UrlStore` and a `Generator` to handle:
/// - Token allocation (custom, or generated with collision retry)
/// - Expiration policy conversion
/// - URL validation
/// - Click counting on resolve
#[derive(Debug, Clone)]
pub struct ShortenerService<S, G, C = SystemClock> {
    store: Arc<S>,
    generator: Arc<G>,
    clock: C,
    settings: ShortenerSettings,
}

impl<S: UrlStore, G: Generator> ShortenerService<S, G> {
    pub fn new(store: S, generator: G) -> Self {
        Self::with_clock(store, generator, SystemClock)
    }
}

impl<S: UrlStore, G: Generator, C: Clock> ShortenerService<S, G, C> {
    pub fn with_clock(store: S, generator: G, clock: C) -> Self {
        Self {
            store: Arc::new(store),
            generator: Arc::new(generator),
            clock,
            settings: ShortenerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ShortenerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ShortenerSettings {
        &self.settings
    }

    /// Validates that the URL has an http(s) scheme and a host.
    fn validate_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        if url.chars().any(char::is_whitespace) {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must not contain whitespace: {url}"
            )));
        }

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {url}"
            )));
        };

        let scheme = scheme.to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {scheme}"
            )));
        }

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a host: {url}"
            )));
        }

        Ok(())
    }

    /// Maps the policy onto the store's expiry.
    ///
    /// An absolute instant is passed through untouched; the store stamps
    /// `created_at` and checks it lies in the future.
    fn expiry_for(&self, expiration: ExpirationPolicy) -> Result<Expiry> {
        let expiry = match expiration {
            ExpirationPolicy::Default => Expiry::Ttl(self.settings.default_ttl),
            ExpirationPolicy::AfterDuration(duration) => Expiry::Ttl(duration),
            ExpirationPolicy::AtTimestamp(at) => Expiry::At(at),
        };

        let in_future = match expiry {
            Expiry::Ttl(ttl) => ttl.is_positive(),
            Expiry::At(at) => at > self.clock.now(),
        };
        if !in_future {
            return Err(ShortenerError::InvalidInput(
                "expiration must be in the future".to_string(),
            ));
        }

        Ok(expiry)
    }

    async fn create_with_generated_token(
        &self,
        original_url: String,
        title: Option<String>,
        expiry: Expiry,
    ) -> Result<UrlRecord> {
        let attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=attempts {
            let token: Token = self.generator.generate().into();
            let new = NewUrl::builder()
                .token(token)
                .original_url(original_url.clone())
                .title_opt(title.clone())
                .expiry(expiry)
                .build();

            match self.store.create(new).await {
                Ok(record) => return Ok(record),
                Err(StoreError::DuplicateToken(token)) => {
                    debug!(%token, attempt, "generated token collided, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(attempts, "could not allocate a free token");
        Err(ShortenerError::TokenExhausted { attempts })
    }
}

#[async_trait]
impl<S: UrlStore, G: Generator, C: Clock> Shortener for ShortenerService<S, G, C> {
    async fn shorten(&self, params: ShortenParams) -> Result<UrlRecord> {
        Self::validate_url(&params.original_url)?;
        let expiry = self.expiry_for(params.expiration)?;

        let record = match params.custom_token {
            Some(token) => {
                let new = NewUrl::builder()
                    .token(token)
                    .original_url(params.original_url)
                    .title_opt(params.title)
                    .expiry(expiry)
                    .build();
                self.store.create(new).await?
            }
            None => {
                self.create_with_generated_token(params.original_url, params.title, expiry)
                    .await?
            }
        };

        info!(token = %record.token, expires_at = %record.expires_at, "url shortened");
        Ok(record)
    }

    async fn resolve(&self, token: &Token) -> Result<UrlRecord> {
        match self.store.record_click(token).await {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound(_)) => {
                // Tell an expired-but-unswept record apart from an unknown one.
                match self.store.lookup_by_token(token, Visibility::Any).await {
                    Ok(_) => Err(ShortenerError::Expired(token.to_string())),
                    Err(err) => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn info(&self, token: &Token) -> Result<UrlRecord> {
        Ok(self.store.lookup_by_token(token, Visibility::Any).await?)
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<UrlRecord>> {
        Ok(self.store.list(query).await?)
    }

    async fn delete(&self, token: &Token) -> Result<()> {
        let record = self.store.lookup_by_token(token, Visibility::Any).await?;
        self.store.delete(&record.id).await?;
        info!(%token, id = %record.id, "url deleted");
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        Ok(self.store.sweep(self.clock.now()).await?)
    }
}
