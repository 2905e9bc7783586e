//! Health and readiness endpoints, outside the DataGateway/Search API
//! dispatch table.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

pub fn custom_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Ready means the pool can hand out a session without blocking on a fresh
/// catalogue handshake — borrow-then-release with a short timeout rather
/// than a dedicated no-op catalogue call.
async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match tokio::time::timeout(Duration::from_millis(500), state.pool.borrow()).await {
        Ok(Ok(guard)) => {
            state.pool.release(guard);
            (
                StatusCode::OK,
                Json(ReadinessResponse {
                    ready: true,
                    message: None,
                }),
            )
        }
        Ok(Err(e)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                message: Some(e.to_string()),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                message: Some("timed out borrowing a session".to_string()),
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}
