use std::sync::Arc;

use quickurl_core::Token;
use quickurl_shortener::Shortener;

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    base_url: String,
}

impl AppState {
    pub fn new(shortener: Arc<dyn Shortener>, public_base_url: impl Into<String>) -> Self {
        Self {
            shortener,
            base_url: public_base_url.into(),
        }
    }

    pub fn shortener(&self) -> &dyn Shortener {
        self.shortener.as_ref()
    }

    /// The public short URL for `token`.
    pub fn short_url(&self, token: &Token) -> String {
        token.to_url(&self.base_url)
    }
}
