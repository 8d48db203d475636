use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use signup_auth::auth_routes;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    handlers::{
        dashboard::dashboard,
        entry::entry,
        health::{healthz, livez},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(entry))
        .route("/dashboard", get(dashboard))
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .merge(auth_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}
