//! Routes for resolving choices as the shared global player.

use adventure_session::domain::commands::ResolveChoice;
use axum::extract::{Path, State};
use axum::{Json, Router, routing::post};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::views::ChoiceResponse;
use crate::state::AppState;

/// Runs `command` through the processor and renders the outcome.
pub(crate) async fn resolve(
    state: &AppState,
    command: ResolveChoice,
) -> Result<Json<ChoiceResponse>, ApiError> {
    info!(
        correlation_id = %command.correlation_id,
        player_id = %command.player_id,
        "handling resolve_choice command"
    );
    let outcome = state.processor.process(&command).await?;
    Ok(Json(ChoiceResponse::from(&outcome)))
}

/// POST /{choice}
#[instrument(skip(state))]
async fn choose_as_global(
    State(state): State<AppState>,
    Path(choice): Path<String>,
) -> Result<Json<ChoiceResponse>, ApiError> {
    resolve(&state, ResolveChoice::global(Uuid::new_v4(), choice)).await
}

/// Returns the router for global-player choices.
pub fn router() -> Router<AppState> {
    Router::new().route("/{choice}", post(choose_as_global))
}
