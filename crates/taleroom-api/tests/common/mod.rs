//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use taleroom_core::narrator::NarratorGateway;
use taleroom_rooms::RoomRegistry;
use taleroom_test_support::{ScriptedNarrator, SequenceIdGenerator};
use tower::ServiceExt;

use taleroom_api::routes;
use taleroom_api::state::AppState;

/// State with deterministic identifiers and the given narrator.
pub fn test_state(ids: SequenceIdGenerator, narrator: Arc<dyn NarratorGateway>) -> AppState {
    AppState::new(
        Arc::new(RoomRegistry::new(Arc::new(ids))),
        narrator,
        Duration::from_secs(2),
    )
}

/// Build the full app router over `state`. Uses the same route structure
/// as `main.rs`.
pub fn build_app(state: AppState) -> Router {
    routes::router().with_state(state)
}

/// Build the full app router with room `QUIL`, participants `p-1`..`p-3`,
/// and a narrator that always answers "The door creaks open.".
pub fn build_test_app() -> Router {
    build_app(test_state(
        SequenceIdGenerator::new(vec!["QUIL"], vec!["p-1", "p-2", "p-3"]),
        Arc::new(ScriptedNarrator::replying(["The door creaks open."])),
    ))
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Serve `app` on an ephemeral local port and return its address.
pub async fn spawn_server(app: Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}
