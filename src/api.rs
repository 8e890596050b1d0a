// src/api.rs
//! Read-only archive API over the document store.
//!
//! GET /health            → "OK"
//! GET /api/latest        → newest post metadata, or `null`
//! GET /api/posts         → all post metadata, newest first
//! GET /api/posts/{slug}  → metadata + markdown body, 404 when missing
//! GET /metrics           → Prometheus exposition (when a handle is attached)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::metrics::Metrics;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

pub fn router(store: Arc<dyn DocumentStore>, metrics: Option<Metrics>) -> Router {
    let mut app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/latest", get(latest))
        .route("/api/posts", get(list_posts))
        .route("/api/posts/{slug}", get(get_post))
        .with_state(AppState { store });

    if let Some(m) = metrics {
        app = app.merge(m.router());
    }
    app.layer(CorsLayer::very_permissive())
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn internal(e: anyhow::Error) -> Response {
    tracing::warn!(error = ?e, "archive read failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "archive unavailable")
}

async fn latest(State(state): State<AppState>) -> Response {
    match state.store.latest().await {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => internal(e),
    }
}

async fn list_posts(State(state): State<AppState>) -> Response {
    match state.store.list().await {
        Ok(docs) => Json(docs).into_response(),
        Err(e) => internal(e),
    }
}

async fn get_post(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match state.store.get(&slug).await {
        Ok(Some(doc)) => Json(doc).into_response(),
        Ok(None) => api_error(StatusCode::NOT_FOUND, "post not found"),
        Err(e) => internal(e),
    }
}
