//! Routes for registered players.

use adventure_session::application::query_handlers;
use adventure_session::domain::commands::{RegisterPlayer, ResolveChoice};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::choices;
use crate::routes::views::{ChoiceResponse, PlayerSceneResponse, PlayerStatsView, SceneView};
use crate::state::AppState;

/// Response body for POST /.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredResponse {
    pub player_id: String,
    #[serde(flatten)]
    pub view: PlayerSceneResponse,
}

/// POST /
#[instrument(skip(state))]
async fn register_player(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let command = RegisterPlayer::new(Uuid::new_v4());

    info!(correlation_id = %command.correlation_id, "handling register_player command");

    let player = state.processor.register(&command).await?;
    let scene = state
        .processor
        .scenes()
        .require_scene(&player.current_scene_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            player_id: player.id.clone(),
            view: PlayerSceneResponse {
                scene: SceneView::from(&scene),
                player: PlayerStatsView::from(&player),
            },
        }),
    ))
}

/// GET /{player_id}
#[instrument(skip(state))]
async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerSceneResponse>, ApiError> {
    let processor = &state.processor;
    let view = query_handlers::get_player_view(
        &player_id,
        processor.players(),
        processor.scenes(),
        &processor.settings().start,
        processor.clock(),
    )
    .await?;
    Ok(Json(PlayerSceneResponse {
        scene: SceneView::from(&view.scene),
        player: PlayerStatsView::from(&view.player),
    }))
}

/// POST /{player_id}/choices/{choice}
#[instrument(skip(state))]
async fn choose(
    State(state): State<AppState>,
    Path((player_id, choice)): Path<(String, String)>,
) -> Result<Json<ChoiceResponse>, ApiError> {
    let command = ResolveChoice {
        correlation_id: Uuid::new_v4(),
        player_id,
        choice,
    };
    choices::resolve(&state, command).await
}

/// Returns the router for player resources.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_player))
        .route("/{player_id}", get(get_player))
        .route("/{player_id}/choices/{choice}", post(choose))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::state::testing::test_state;

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_register_returns_201_with_start_scene() {
        // Arrange
        let app = router().with_state(test_state().await);

        // Act
        let (status, json) = send(app, "POST", "/").await;

        // Assert
        assert_eq!(status, StatusCode::CREATED);
        assert!(json["playerId"].is_string());
        assert_eq!(json["player"]["id"], json["playerId"]);
        assert_eq!(json["scene"]["id"], "start");
        assert_eq!(json["player"]["health"], 100);
    }

    #[tokio::test]
    async fn test_registered_player_can_choose() {
        // Arrange
        let state = test_state().await;
        let (_, registered) = send(router().with_state(state.clone()), "POST", "/").await;
        let id = registered["playerId"].as_str().unwrap().to_owned();

        // Act
        let (status, json) = send(
            router().with_state(state.clone()),
            "POST",
            &format!("/{id}/choices/b"),
        )
        .await;
        let (_, view) = send(router().with_state(state), "GET", &format!("/{id}")).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["scene"]["id"], "light_path");
        assert_eq!(json["player"]["gold"], 5);
        assert_eq!(view["scene"]["id"], "light_path");
        assert_eq!(view["player"]["gold"], 5);
    }

    #[tokio::test]
    async fn test_unknown_player_returns_404() {
        let app = router().with_state(test_state().await);

        let (status, json) = send(app, "GET", "/ghost").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "player_not_found");
    }

    #[tokio::test]
    async fn test_unknown_player_choice_returns_404() {
        let app = router().with_state(test_state().await);

        let (status, _) = send(app, "POST", "/ghost/choices/a").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
