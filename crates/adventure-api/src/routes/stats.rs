//! Aggregate statistics endpoint.

use adventure_session::application::query_handlers;
use adventure_stats::AggregateStats;
use axum::extract::State;
use axum::{Json, Router, routing::get};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /
#[instrument(skip(state))]
async fn get_stats(State(state): State<AppState>) -> Result<Json<AggregateStats>, ApiError> {
    let stats = query_handlers::get_stats(state.processor.stats()).await?;
    Ok(Json(stats))
}

/// Returns the router for aggregate statistics.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_stats))
}
