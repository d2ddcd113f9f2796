use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_url_handler, delete_url_handler, get_url_handler, health_handler, list_urls_handler,
    redirect_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(health_handler))
            .route("/health", get(health_handler))
            .route("/shorten", post(create_url_handler))
            .route("/urls", get(list_urls_handler))
            .route(
                "/urls/{token}",
                get(get_url_handler).delete(delete_url_handler),
            )
            .route("/{token}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
