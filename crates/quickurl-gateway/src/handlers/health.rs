use crate::model::HealthResponse;
use axum::Json;

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "QuickURL",
        version: env!("CARGO_PKG_VERSION"),
    })
}
