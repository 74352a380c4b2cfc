//! Adventure engine: HTTP surface.
//!
//! A thin JSON layer over the session context: routes translate requests
//! into commands and queries, and `ApiError` maps the domain error taxonomy
//! onto status codes.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with configured origins before exposing publicly.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/choices", routes::choices::router())
        .nest("/api/v1/players", routes::players::router())
        .nest("/api/v1/stats", routes::stats::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
