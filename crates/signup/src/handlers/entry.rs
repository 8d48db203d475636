//! The entry page: sign-up buttons and the redirect result resolver.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use signup_auth::{resolve_entry, EntryOutcome, EntryView, Visitor};
use signup_core::forms::deserialize_optional_string;

use super::template::HtmlTemplate;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryQuery {
    /// Left by the Apple mock sign-in instead of a provider callback.
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub apple_mock_redirect: Option<String>,
}

impl EntryQuery {
    pub fn is_mock_redirect(&self) -> bool {
        self.apple_mock_redirect.as_deref() == Some("1")
    }
}

#[derive(Template)]
#[template(path = "entry.html")]
struct EntryTemplate {
    view: EntryView,
}

/// Handler for GET /
///
/// Resolves any finished redirect, then either moves on to the dashboard or
/// renders the buttons with the current status.
pub async fn entry(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
    mut visitor: Visitor,
) -> Response {
    let outcome = resolve_entry(&state.auth, &mut visitor, query.is_mock_redirect()).await;
    let jar = visitor.into_jar();

    match outcome {
        EntryOutcome::Navigate(target) => (jar, Redirect::to(target)).into_response(),
        EntryOutcome::Render(view) => (jar, HtmlTemplate(EntryTemplate { view })).into_response(),
    }
}
