//! Axum extractors for the browser's tab and sign-in state.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use signup_core::auth::{AuthState as SignInState, Persistence, SessionId};
use signup_core::identity::Identity;
use signup_core::tab::TabId;

use crate::config::AuthConfig;
use crate::flash::FlashMessage;
use crate::tab::BrowserTab;
use crate::AuthState;

/// The requesting browser: its tab storage, identity-layer session and the
/// cookies to send back.
///
/// A request without a valid tab cookie gets a fresh tab. Responses must
/// return [`Visitor::into_jar`] so the new tab cookie reaches the browser.
pub struct Visitor {
    pub tab: BrowserTab,
    session: Option<SessionId>,
    jar: CookieJar,
    config: AuthConfig,
}

impl Visitor {
    fn from_parts(parts: &Parts, state: &AuthState) -> Self {
        let config = state.config.clone();
        let mut jar = CookieJar::from_headers(&parts.headers);

        let tab_id = match jar
            .get(&config.tab_cookie_name)
            .and_then(|c| TabId::parse(c.value()))
        {
            Some(id) => id,
            None => {
                let id = TabId::new();
                jar = jar.add(tab_cookie(&config, &id));
                id
            }
        };

        let session = jar
            .get(&config.cookie_name)
            .map(|c| c.value())
            .filter(|v| !v.is_empty())
            .map(|v| SessionId::new(v.to_string()));

        Self {
            tab: BrowserTab::new(state.tabs.clone(), tab_id),
            session,
            jar,
            config,
        }
    }

    pub fn tab_id(&self) -> &TabId {
        self.tab.id()
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Point the browser at `id`, remembered according to `persistence`.
    pub fn set_session(&mut self, id: SessionId, persistence: Persistence) {
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(session_cookie(&self.config, &id, persistence));
        self.session = Some(id);
    }

    pub fn clear_session(&mut self) {
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.remove(Cookie::build(self.config.cookie_name.clone()).path("/"));
        self.session = None;
    }

    /// Consume the pending flash message, if any.
    pub fn take_flash(&mut self) -> Option<FlashMessage> {
        let (jar, flash) = FlashMessage::take(std::mem::take(&mut self.jar));
        self.jar = jar;
        flash
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl<S> FromRequestParts<S> for Visitor
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        Ok(Self::from_parts(parts, &auth_state))
    }
}

/// Tab cookie: lives as long as the browser session.
fn tab_cookie(config: &AuthConfig, id: &TabId) -> Cookie<'static> {
    Cookie::build((config.tab_cookie_name.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Session cookie. `Local` outlives the browser, `Session` does not.
fn session_cookie(config: &AuthConfig, id: &SessionId, persistence: Persistence) -> Cookie<'static> {
    let builder = Cookie::build((config.cookie_name.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax);

    match persistence {
        Persistence::Local => builder
            .max_age(time::Duration::seconds(config.session_ttl.as_secs() as i64))
            .build(),
        Persistence::Session => builder.build(),
    }
}

/// Whoever this browser is signed in as, mock record first.
async fn resolve_identity(visitor: &Visitor, state: &AuthState) -> SignInState {
    if let Some(identity) = visitor.tab.mock_user().await {
        return SignInState::SignedIn(identity);
    }

    let (Ok(layer), Some(session)) = (state.layer(), visitor.session()) else {
        return SignInState::SignedOut;
    };

    layer
        .subscribe(session)
        .await
        .settled_within(state.config.auth_state_timeout)
        .await
}

/// Extractor for the signed-in identity. Returns 401 if signed out.
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let visitor = Visitor::from_parts(parts, &auth_state);

        match resolve_identity(&visitor, &auth_state).await {
            SignInState::SignedIn(identity) => Ok(CurrentIdentity(identity)),
            SignInState::Pending => Err((StatusCode::SERVICE_UNAVAILABLE, "Session lookup timed out")),
            SignInState::SignedOut => Err((StatusCode::UNAUTHORIZED, "Not signed in")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn config() -> AuthConfig {
        AuthConfig::for_base_url(Url::parse("http://localhost:3000").unwrap())
    }

    #[test]
    fn test_local_session_cookie_has_max_age() {
        let cookie = session_cookie(
            &config(),
            &SessionId::new("abc".to_string()),
            Persistence::Local,
        );
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(7 * 24 * 60 * 60))
        );
    }

    #[test]
    fn test_session_persistence_cookie_has_no_max_age() {
        let cookie = session_cookie(
            &config(),
            &SessionId::new("abc".to_string()),
            Persistence::Session,
        );
        assert_eq!(cookie.max_age(), None);
    }

    #[test]
    fn test_tab_cookie_is_a_browser_session_cookie() {
        let cookie = tab_cookie(&config(), &TabId::new());
        assert_eq!(cookie.name(), "signup_tab");
        assert_eq!(cookie.max_age(), None);
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
