use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use quickurl_shortener::ShortenerError;
use tracing::{error, warn};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound,
    Shortener(ShortenerError),
}

impl From<ShortenerError> for AppError {
    fn from(error: ShortenerError) -> Self {
        AppError::Shortener(error)
    }
}

impl AppError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound => (StatusCode::NOT_FOUND, "URL not found".to_string()),
            AppError::Shortener(error) => match error {
                ShortenerError::InvalidUrl(_) | ShortenerError::InvalidInput(_) => {
                    (StatusCode::BAD_REQUEST, error.to_string())
                }
                ShortenerError::TokenConflict(_) => (StatusCode::CONFLICT, error.to_string()),
                ShortenerError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "URL not found".to_string())
                }
                ShortenerError::Expired(_) => (StatusCode::GONE, "URL has expired".to_string()),
                ShortenerError::TokenExhausted { .. } => {
                    warn!(error = %error, "token allocation failed");
                    (StatusCode::SERVICE_UNAVAILABLE, error.to_string())
                }
                ShortenerError::Storage(ref source) if source.is_retryable() => {
                    warn!(error = %source, "storage temporarily unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "storage temporarily unavailable".to_string(),
                    )
                }
                ShortenerError::Storage(source) => {
                    error!(error = %source, "storage failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal storage error".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
