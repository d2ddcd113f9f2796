mod health;
mod redirect;
mod url;

pub use health::health_handler;
pub use redirect::redirect_handler;
pub use url::{create_url_handler, delete_url_handler, get_url_handler, list_urls_handler};

use crate::error::AppError;
use quickurl_core::Token;

/// Parses a token from the path. A malformed token can never be stored, so
/// it is reported as not found.
pub(crate) fn path_token(raw: String) -> Result<Token, AppError> {
    Token::new(raw).map_err(|_| AppError::NotFound)
}
