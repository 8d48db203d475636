//! The signed-in dashboard.

use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use signup_auth::{guard_dashboard, redirect_with_flash, DashboardOutcome, Visitor};
use signup_core::flow::ENTRY_PATH;
use signup_core::identity::ProfileView;

use super::template::HtmlTemplate;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    profile: ProfileView,
}

/// Shown while the session lookup is still running.
#[derive(Template)]
#[template(path = "loading.html")]
struct LoadingTemplate {
    refresh_secs: u32,
}

/// Handler for GET /dashboard
pub async fn dashboard(State(state): State<AppState>, visitor: Visitor) -> Response {
    let outcome = guard_dashboard(&state.auth, &visitor).await;
    let jar = visitor.into_jar();

    match outcome {
        DashboardOutcome::Profile(profile) => {
            (jar, HtmlTemplate(DashboardTemplate { profile })).into_response()
        }
        DashboardOutcome::Loading => {
            (jar, HtmlTemplate(LoadingTemplate { refresh_secs: 1 })).into_response()
        }
        DashboardOutcome::Redirect(Some(flash)) => redirect_with_flash(jar, ENTRY_PATH, flash),
        DashboardOutcome::Redirect(None) => (jar, Redirect::to(ENTRY_PATH)).into_response(),
    }
}
