//! The provider round trip both identity layers share.

use std::sync::Arc;

use chrono::{Duration, Utc};
use openidconnect::PkceCodeChallenge;
use signup_core::auth::{
    generate_state, is_flow_expired, AuthError, AuthFlowState, OidcProvider, Persistence,
    RedirectCallback, Result, SessionId, SessionRepository,
};
use signup_core::identity::Identity;
use url::Url;

use crate::providers::ProviderRegistry;

/// What came back from the provider, tied to the browser session that
/// started the flow.
pub(crate) struct CompletedFlow {
    pub session: SessionId,
    pub provider: OidcProvider,
    pub persistence: Persistence,
    pub result: Result<Identity>,
}

/// PKCE + state bookkeeping around the provider clients.
pub(crate) struct OidcFlow {
    providers: ProviderRegistry,
    sessions: Arc<dyn SessionRepository>,
    flow_ttl: Duration,
}

impl OidcFlow {
    pub fn new(
        providers: ProviderRegistry,
        sessions: Arc<dyn SessionRepository>,
        flow_ttl: std::time::Duration,
    ) -> Self {
        Self {
            providers,
            sessions,
            flow_ttl: Duration::seconds(flow_ttl.as_secs() as i64),
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionRepository> {
        &self.sessions
    }

    /// Store a fresh PKCE verifier under a new CSRF state and return the
    /// provider's authorization URL.
    pub async fn start(
        &self,
        session: &SessionId,
        provider: OidcProvider,
        persistence: Persistence,
    ) -> Result<Url> {
        let client = self
            .providers
            .get(provider)
            .map_err(|_| AuthError::Provider(format!("{} sign-in is not configured", provider.label())))?;

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let csrf_state = generate_state();

        let flow = AuthFlowState {
            pkce_verifier: pkce_verifier.secret().to_string(),
            provider,
            session_id: session.clone(),
            persistence,
            created_at: Utc::now(),
        };
        self.sessions.store_auth_flow(&csrf_state, &flow).await?;

        let url = client
            .authorization_url(&csrf_state, pkce_challenge.as_str())
            .await?;

        tracing::debug!(%provider, session = %session, "Auth flow started");
        Ok(url)
    }

    /// Redeem the callback's state and exchange its code.
    ///
    /// Fails only when the state is unknown, since then there is no session
    /// to report to. Every later failure is returned inside the flow.
    pub async fn complete(&self, callback: RedirectCallback) -> Result<CompletedFlow> {
        let flow = self
            .sessions
            .take_auth_flow(&callback.state)
            .await?
            .ok_or(AuthError::InvalidState)?;

        let result = self.redeem(&flow, callback).await;
        if let Err(ref e) = result {
            tracing::warn!(provider = %flow.provider, error = %e, "Redirect sign-in failed");
        }

        Ok(CompletedFlow {
            session: flow.session_id,
            provider: flow.provider,
            persistence: flow.persistence,
            result,
        })
    }

    async fn redeem(&self, flow: &AuthFlowState, callback: RedirectCallback) -> Result<Identity> {
        if let Some(code) = callback.error {
            let message = callback
                .error_description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| code.clone());
            return Err(AuthError::Rejected { code, message });
        }

        if is_flow_expired(flow, Utc::now(), self.flow_ttl) {
            return Err(AuthError::FlowExpired);
        }

        let code = callback
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::CodeExchange("missing authorization code".to_string()))?;

        let client = self
            .providers
            .get(flow.provider)
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        let mut claims = client.exchange_code(&code, &flow.pkce_verifier).await?;

        // Apple only shares the name on the first authorization, in the form body.
        if flow.provider == OidcProvider::Apple {
            if let Some(name) = callback.user_name {
                claims.name = Some(name);
            }
        }

        Identity::from_claims(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::InMemorySessionStore;
    use crate::test_support::StubProvider;

    fn flow(sessions: Arc<InMemorySessionStore>) -> OidcFlow {
        let providers = ProviderRegistry::new()
            .with(Arc::new(StubProvider::new(OidcProvider::Google)))
            .with(Arc::new(StubProvider::new(OidcProvider::Apple)));
        OidcFlow::new(providers, sessions, std::time::Duration::from_secs(600))
    }

    #[tokio::test]
    async fn test_start_then_complete() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let oidc = flow(sessions.clone());
        let session = SessionId::new("browser-1".to_string());

        let url = oidc
            .start(&session, OidcProvider::Google, Persistence::Session)
            .await
            .unwrap();
        let state = StubProvider::state_from(&url);

        let completed = oidc
            .complete(RedirectCallback {
                state,
                code: Some("good-code".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(completed.session, session);
        assert_eq!(completed.provider, OidcProvider::Google);
        assert_eq!(completed.persistence, Persistence::Session);
        assert_eq!(completed.result.unwrap().uid, "stub-google-user");
    }

    #[tokio::test]
    async fn test_unknown_state_is_rejected() {
        let oidc = flow(Arc::new(InMemorySessionStore::new()));
        let result = oidc
            .complete(RedirectCallback {
                state: "never-issued".to_string(),
                code: Some("code".to_string()),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidState)));
    }

    #[tokio::test]
    async fn test_provider_error_becomes_rejection() {
        let oidc = flow(Arc::new(InMemorySessionStore::new()));
        let session = SessionId::new("browser-1".to_string());
        let url = oidc
            .start(&session, OidcProvider::Apple, Persistence::Local)
            .await
            .unwrap();

        let completed = oidc
            .complete(RedirectCallback {
                state: StubProvider::state_from(&url),
                error: Some("user_cancelled_authorize".to_string()),
                error_description: Some("The user cancelled".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = completed.result.unwrap_err();
        assert_eq!(err.code(), Some("user_cancelled_authorize"));
        assert_eq!(err.to_string(), "The user cancelled");
    }

    #[tokio::test]
    async fn test_expired_flow() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let oidc = flow(sessions.clone());
        sessions
            .store_auth_flow(
                "old-state",
                &AuthFlowState {
                    pkce_verifier: "v".to_string(),
                    provider: OidcProvider::Google,
                    session_id: SessionId::new("browser-1".to_string()),
                    persistence: Persistence::Local,
                    created_at: Utc::now() - Duration::minutes(30),
                },
            )
            .await
            .unwrap();

        let completed = oidc
            .complete(RedirectCallback {
                state: "old-state".to_string(),
                code: Some("good-code".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(matches!(completed.result, Err(AuthError::FlowExpired)));
    }

    #[tokio::test]
    async fn test_apple_form_name_overrides_claims() {
        let oidc = flow(Arc::new(InMemorySessionStore::new()));
        let session = SessionId::new("browser-1".to_string());
        let url = oidc
            .start(&session, OidcProvider::Apple, Persistence::Local)
            .await
            .unwrap();

        let completed = oidc
            .complete(RedirectCallback {
                state: StubProvider::state_from(&url),
                code: Some("good-code".to_string()),
                user_name: Some("Jane Appleseed".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let identity = completed.result.unwrap();
        assert_eq!(identity.display_name.as_deref(), Some("Jane Appleseed"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_cannot_start() {
        let oidc = OidcFlow::new(
            ProviderRegistry::new().with(Arc::new(StubProvider::new(OidcProvider::Google))),
            Arc::new(InMemorySessionStore::new()),
            std::time::Duration::from_secs(600),
        );
        let err = oidc
            .start(
                &SessionId::new("b".to_string()),
                OidcProvider::Apple,
                Persistence::Local,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Apple sign-in is not configured"));
    }
}
