//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use adventure_core::store::KeyValueStore;
use adventure_narrative::application::generator::ContentGenerator;
use adventure_narrative::domain::seed::SeedGraph;
use adventure_session::application::choice_processor::{ChoiceProcessor, ProcessorSettings};
use adventure_store::MemoryStore;
use adventure_test_support::FixedClock;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use adventure_api::app;
use adventure_api::state::AppState;

/// Build the full app over `store` with the embedded seed graph, a fixed
/// clock and procedural-only generation. Uses the same router as `main.rs`.
pub async fn build_test_app_with_store(store: Arc<dyn KeyValueStore>) -> Router {
    let processor = ChoiceProcessor::new(
        store,
        ContentGenerator::procedural_only(),
        Arc::new(FixedClock::epoch()),
        ProcessorSettings::default(),
    );
    processor
        .scenes()
        .load_seed(&SeedGraph::embedded().unwrap())
        .await
        .unwrap();
    app(AppState::new(processor))
}

/// Build the full app over a fresh in-memory store.
pub async fn build_test_app() -> Router {
    build_test_app_with_store(Arc::new(MemoryStore::new())).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request without a body and return the response.
pub async fn post(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}
