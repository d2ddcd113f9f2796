mod url;

pub use url::{CreateUrlRequest, ListUrlsQuery, ListUrlsResponse, UrlResponse};

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
