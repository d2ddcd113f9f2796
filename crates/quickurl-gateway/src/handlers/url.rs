use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use quickurl_shortener::ShortenParams;

use crate::error::{AppError, Result};
use crate::handlers::path_token;
use crate::model::{CreateUrlRequest, ListUrlsQuery, ListUrlsResponse, UrlResponse};
use crate::state::AppState;

pub async fn create_url_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UrlResponse>)> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let params = ShortenParams::try_from(request)?;

    let record = state.shortener().shorten(params).await?;
    let short_url = state.short_url(&record.token);

    Ok((StatusCode::CREATED, Json(UrlResponse::new(record, short_url))))
}

pub async fn list_urls_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListUrlsQuery>, QueryRejection>,
) -> Result<Json<ListUrlsResponse>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let records = state.shortener().list(query.into()).await?;
    let urls = records
        .into_iter()
        .map(|record| {
            let short_url = state.short_url(&record.token);
            UrlResponse::new(record, short_url)
        })
        .collect();

    Ok(Json(ListUrlsResponse { urls }))
}

pub async fn get_url_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UrlResponse>> {
    let token = path_token(token)?;
    let record = state.shortener().info(&token).await?;
    let short_url = state.short_url(&record.token);

    Ok(Json(UrlResponse::new(record, short_url)))
}

pub async fn delete_url_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    let token = path_token(token)?;
    state.shortener().delete(&token).await?;

    Ok(StatusCode::NO_CONTENT)
}
