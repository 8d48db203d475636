//! HTTP handlers for auth routes.

use axum::{
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use signup_core::auth::{
    generate_session_id, IdentityLayer, OidcProvider, Persistence, RedirectCallback, SessionId,
};
use signup_core::flow::{APPLE_MOCK_FLAG, ENTRY_PATH};
use signup_core::forms::deserialize_optional_string;
use signup_core::identity::Identity;
use url::Url;

use crate::error::AuthError;
use crate::extractors::{CurrentIdentity, Visitor};
use crate::flash::{redirect_with_flash, FlashMessage};
use crate::guard;
use crate::tab::BrowserTab;
use crate::AuthState;

/// Query parameters for the Google callback.
#[derive(Deserialize)]
pub struct CallbackQuery {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub error_description: Option<String>,
}

/// Apple sends callback as POST with form data.
#[derive(Deserialize)]
pub struct AppleCallbackForm {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub error_description: Option<String>,
    /// JSON string with name on first login.
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub user: Option<String>,
}

/// Creates the auth router with all authentication routes.
///
/// Routes:
/// - `POST /auth/{provider}/start` - Begin a redirect sign-in
/// - `GET /auth/google/callback` - Handle Google OIDC callback
/// - `POST /auth/apple/callback` - Handle Apple OIDC callback (form POST)
/// - `POST /auth/logout` - End current session
/// - `GET /auth/me` - Get current signed-in identity
pub fn auth_routes<S>() -> Router<S>
where
    AuthState: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/auth/{provider}/start", post(start))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/apple/callback", post(apple_callback))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

async fn start(
    State(state): State<AuthState>,
    Path(provider): Path<String>,
    mut visitor: Visitor,
) -> Response {
    let Ok(provider) = provider.parse::<OidcProvider>() else {
        return AuthError::ProviderNotConfigured(provider).into_response();
    };

    let Some(_busy) = state.busy.acquire(visitor.tab_id()) else {
        tracing::debug!(tab = %visitor.tab_id(), "Sign-in already in progress");
        return (visitor.into_jar(), Redirect::to(ENTRY_PATH)).into_response();
    };

    let tab = visitor.tab.clone();
    let label = provider.label();

    if provider == OidcProvider::Apple && state.config.apple_mock_enabled {
        tab.debug("Apple mock button clicked").await;
        tab.record_attempt(provider).await;
        let target = format!("{ENTRY_PATH}?{APPLE_MOCK_FLAG}=1");
        return (visitor.into_jar(), Redirect::to(&target)).into_response();
    }

    tab.debug(format!("{label} button clicked")).await;

    let layer = match state.layer() {
        Ok(layer) => layer.clone(),
        Err(e) => {
            tab.debug(format!("{label} start error: {e}")).await;
            return redirect_with_flash(
                visitor.into_jar(),
                ENTRY_PATH,
                FlashMessage::error(e.user_message()),
            );
        }
    };

    // Each redirect runs under a server-minted id, whatever cookie came in.
    let session = generate_session_id();

    match begin_redirect(layer.as_ref(), &tab, &session, provider).await {
        Ok((url, persistence)) => {
            visitor.set_session(session, persistence);
            (visitor.into_jar(), Redirect::to(url.as_str())).into_response()
        }
        Err(e) => {
            // Navigation never began, so the markers would report a lost session.
            tab.clear_markers().await;
            tab.debug(format!("{label} start error: {}", e.code().unwrap_or(e.kind())))
                .await;
            tracing::warn!(%provider, error = %e, "Failed to start redirect");
            redirect_with_flash(
                visitor.into_jar(),
                ENTRY_PATH,
                FlashMessage::error(e.to_string()),
            )
        }
    }
}

/// Everything between the click and the navigation. The attempt marker is
/// written before the provider URL is produced.
async fn begin_redirect(
    layer: &dyn IdentityLayer,
    tab: &BrowserTab,
    session: &SessionId,
    provider: OidcProvider,
) -> signup_core::auth::Result<(Url, Persistence)> {
    let persistence = layer.set_persistence(session, Persistence::Local).await?;
    tab.debug(format!("Auth persistence set to {persistence}"))
        .await;

    tab.record_attempt(provider).await;
    tab.debug(format!("Calling start_redirect for {}", provider.label()))
        .await;

    let url = layer.start_redirect(session, provider, persistence).await?;
    Ok((url, persistence))
}

async fn google_callback(
    State(state): State<AuthState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let callback = RedirectCallback {
        state: params.state,
        code: params.code,
        error: params.error,
        error_description: params.error_description,
        user_name: None,
    };
    complete(&state, jar, callback).await
}

async fn apple_callback(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<AppleCallbackForm>,
) -> Response {
    let callback = RedirectCallback {
        state: form.state,
        code: form.code,
        error: form.error,
        error_description: form.error_description,
        user_name: form.user.as_deref().and_then(apple_user_name),
    };
    complete(&state, jar, callback).await
}

/// Name from Apple's first-login `user` JSON blob.
fn apple_user_name(user: &str) -> Option<String> {
    let user: serde_json::Value = serde_json::from_str(user).ok()?;
    let name = user.get("name")?;
    let parts: Vec<&str> = ["firstName", "lastName"]
        .iter()
        .filter_map(|key| name.get(key)?.as_str())
        .filter(|part| !part.is_empty())
        .collect();

    (!parts.is_empty()).then(|| parts.join(" "))
}

async fn complete(state: &AuthState, jar: CookieJar, callback: RedirectCallback) -> Response {
    let layer = match state.layer() {
        Ok(layer) => layer,
        Err(e) => return redirect_with_flash(jar, ENTRY_PATH, FlashMessage::error(e.user_message())),
    };

    match layer.complete_redirect(callback).await {
        Ok(session) => {
            tracing::debug!(session = %session, "Redirect outcome recorded");
            (jar, Redirect::to(ENTRY_PATH)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected provider callback");
            let message = AuthError::from(e).user_message();
            redirect_with_flash(jar, ENTRY_PATH, FlashMessage::error(message))
        }
    }
}

async fn logout(State(state): State<AuthState>, mut visitor: Visitor) -> (CookieJar, Redirect) {
    guard::sign_out(&state, &mut visitor).await;
    (visitor.into_jar(), Redirect::to(ENTRY_PATH))
}

async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<Identity> {
    Json(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apple_user_name_joins_parts() {
        assert_eq!(
            apple_user_name(r#"{"name":{"firstName":"Jane","lastName":"Appleseed"}}"#),
            Some("Jane Appleseed".to_string())
        );
        assert_eq!(
            apple_user_name(r#"{"name":{"firstName":"Jane","lastName":""}}"#),
            Some("Jane".to_string())
        );
    }

    #[test]
    fn test_apple_user_name_ignores_garbage() {
        assert_eq!(apple_user_name("not json"), None);
        assert_eq!(apple_user_name(r#"{"email":"x@example.com"}"#), None);
        assert_eq!(apple_user_name(r#"{"name":{}}"#), None);
    }
}
