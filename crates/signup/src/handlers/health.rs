//! Health check endpoints for Kubernetes-style probes.
//!
//! - `/livez` - Basic liveness probe (immediate 200, no checks)
//! - `/healthz` - Identity layer status (503 while sign-in is disabled)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::state::AppState;

/// GET /livez - Basic liveness probe.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Which strategy is active and whether sign-in works.
#[axum::debug_handler]
pub async fn healthz(State(state): State<AppState>) -> Response {
    let auth = &state.auth;
    let status = if auth.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "strategy": auth.config.strategy.to_string(),
            "ready": auth.is_ready(),
            "appleMock": auth.config.apple_mock_enabled,
        })),
    )
        .into_response()
}
