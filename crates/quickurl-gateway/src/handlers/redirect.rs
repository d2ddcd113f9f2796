use axum::extract::{Path, State};
use axum::response::Redirect;
use tracing::debug;

use crate::error::Result;
use crate::handlers::path_token;
use crate::state::AppState;

pub async fn redirect_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let token = path_token(token)?;
    let record = state.shortener().resolve(&token).await?;

    debug!(%token, clicks = record.click_count, "redirecting");
    Ok(Redirect::permanent(&record.original_url))
}
