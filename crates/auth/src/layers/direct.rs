//! Identity layer where the session is fixed at sign-in and the browser picks
//! how long it is remembered.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use signup_core::auth::{
    calculate_expiry, generate_session_id, is_session_expired, AuthState, AuthStateSubscription,
    AuthStrategy, IdentityLayer, OidcProvider, Persistence, RedirectCallback, RedirectOutcome,
    Result, Session, SessionId, SessionRepository, SignedIn,
};
use url::Url;

use super::hub::AuthStateHub;
use super::oidc::OidcFlow;

pub struct DirectRedirectLayer {
    flow: OidcFlow,
    hub: AuthStateHub,
    session_ttl: Duration,
}

impl DirectRedirectLayer {
    pub(crate) fn new(flow: OidcFlow, session_ttl: std::time::Duration) -> Self {
        Self {
            flow,
            hub: AuthStateHub::new(),
            session_ttl: Duration::seconds(session_ttl.as_secs() as i64),
        }
    }

    fn sessions(&self) -> Arc<dyn SessionRepository> {
        self.flow.sessions().clone()
    }
}

/// Current state of a session whose expiry never moves.
async fn lookup(sessions: Arc<dyn SessionRepository>, id: SessionId) -> AuthState {
    match sessions.get_session(&id).await {
        Ok(Some(session)) if is_session_expired(&session, Utc::now()) => {
            if let Err(e) = sessions.delete_session(&id).await {
                tracing::warn!(error = %e, "Failed to delete expired session");
            }
            AuthState::SignedOut
        }
        Ok(Some(session)) => AuthState::SignedIn(session.identity),
        Ok(None) => AuthState::SignedOut,
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed");
            AuthState::SignedOut
        }
    }
}

#[async_trait]
impl IdentityLayer for DirectRedirectLayer {
    fn strategy(&self) -> AuthStrategy {
        AuthStrategy::Direct
    }

    /// Any mode is honoured. It is applied when the redirect completes.
    async fn set_persistence(
        &self,
        _session: &SessionId,
        persistence: Persistence,
    ) -> Result<Persistence> {
        Ok(persistence)
    }

    async fn start_redirect(
        &self,
        session: &SessionId,
        provider: OidcProvider,
        persistence: Persistence,
    ) -> Result<Url> {
        self.flow.start(session, provider, persistence).await
    }

    async fn complete_redirect(&self, callback: RedirectCallback) -> Result<SessionId> {
        let completed = self.flow.complete(callback).await?;

        let outcome = match completed.result {
            Ok(identity) => {
                let now = Utc::now();
                let session = Session {
                    id: generate_session_id(),
                    identity: identity.clone(),
                    persistence: completed.persistence,
                    created_at: now,
                    expires_at: calculate_expiry(now, self.session_ttl),
                };
                self.sessions().create_session(&session).await?;
                self.hub
                    .publish(&session.id, AuthState::SignedIn(identity.clone()));
                tracing::info!(provider = %completed.provider, uid = %identity.uid, "User signed in");
                RedirectOutcome::Success(SignedIn {
                    session: session.id,
                    persistence: session.persistence,
                    identity,
                })
            }
            Err(e) => RedirectOutcome::failure(&e),
        };

        self.sessions()
            .store_outcome(&completed.session, &outcome)
            .await?;
        Ok(completed.session)
    }

    async fn get_redirect_result(&self, session: &SessionId) -> Result<Option<SignedIn>> {
        self.sessions()
            .take_outcome(session)
            .await?
            .map(RedirectOutcome::into_result)
            .transpose()
    }

    async fn subscribe(&self, session: &SessionId) -> AuthStateSubscription {
        self.hub
            .subscribe(session, lookup(self.sessions(), session.clone()))
    }

    async fn sign_out(&self, session: &SessionId) -> Result<()> {
        self.sessions().delete_session(session).await?;
        self.hub.publish(session, AuthState::SignedOut);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderRegistry;
    use crate::sessions::InMemorySessionStore;
    use crate::test_support::StubProvider;
    use signup_core::auth::AuthError;
    use signup_core::identity::Identity;

    fn layer() -> (DirectRedirectLayer, Arc<InMemorySessionStore>) {
        let sessions = Arc::new(InMemorySessionStore::new());
        let providers = ProviderRegistry::new()
            .with(Arc::new(StubProvider::new(OidcProvider::Google)))
            .with(Arc::new(StubProvider::new(OidcProvider::Apple)));
        let flow = OidcFlow::new(providers, sessions.clone(), std::time::Duration::from_secs(600));
        (
            DirectRedirectLayer::new(flow, std::time::Duration::from_secs(3600)),
            sessions,
        )
    }

    async fn sign_in(
        layer: &DirectRedirectLayer,
        session: &SessionId,
        persistence: Persistence,
        code: &str,
    ) {
        let persistence = layer.set_persistence(session, persistence).await.unwrap();
        let url = layer
            .start_redirect(session, OidcProvider::Google, persistence)
            .await
            .unwrap();
        layer
            .complete_redirect(RedirectCallback {
                state: StubProvider::state_from(&url),
                code: Some(code.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_redirect_result_is_one_shot() {
        let (layer, _) = layer();
        let session = SessionId::new("browser-1".to_string());
        sign_in(&layer, &session, Persistence::Local, "good-code").await;

        let signed_in = layer.get_redirect_result(&session).await.unwrap().unwrap();
        assert_eq!(signed_in.identity.uid, "stub-google-user");
        assert_eq!(layer.get_redirect_result(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_rotates_session_id() {
        let (layer, sessions) = layer();
        let fixed = SessionId::new("attacker-fixed".to_string());
        sign_in(&layer, &fixed, Persistence::Local, "good-code").await;

        let signed_in = layer.get_redirect_result(&fixed).await.unwrap().unwrap();
        assert_ne!(signed_in.session, fixed);
        assert!(sessions.get_session(&fixed).await.unwrap().is_none());
        assert!(sessions
            .get_session(&signed_in.session)
            .await
            .unwrap()
            .is_some());

        let mut old = layer.subscribe(&fixed).await;
        assert_eq!(old.settled().await, AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_failed_exchange_is_reported_once() {
        let (layer, sessions) = layer();
        let session = SessionId::new("browser-1".to_string());
        sign_in(&layer, &session, Persistence::Local, "bad-code").await;

        let err = layer.get_redirect_result(&session).await.unwrap_err();
        assert_eq!(err.code(), Some("code_exchange_failed"));
        assert_eq!(layer.get_redirect_result(&session).await.unwrap(), None);
        assert_eq!(sessions.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_requested_persistence_travels_with_the_flow() {
        let (layer, sessions) = layer();
        let session = SessionId::new("browser-1".to_string());
        sign_in(&layer, &session, Persistence::Session, "good-code").await;

        let signed_in = layer.get_redirect_result(&session).await.unwrap().unwrap();
        assert_eq!(signed_in.persistence, Persistence::Session);
        let stored = sessions
            .get_session(&signed_in.session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.persistence, Persistence::Session);
    }

    #[tokio::test]
    async fn test_abandoned_starts_leave_only_pending_flows() {
        let (layer, sessions) = layer();
        for i in 0..50 {
            let session = SessionId::new(format!("browser-{i}"));
            let persistence = layer
                .set_persistence(&session, Persistence::Session)
                .await
                .unwrap();
            layer
                .start_redirect(&session, OidcProvider::Google, persistence)
                .await
                .unwrap();
        }

        assert_eq!(sessions.pending_flow_count().await, 50);
        assert_eq!(sessions.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_sees_signed_in_then_signed_out() {
        let (layer, _) = layer();
        let session = SessionId::new("browser-1".to_string());
        sign_in(&layer, &session, Persistence::Local, "good-code").await;
        let signed_in = layer.get_redirect_result(&session).await.unwrap().unwrap();

        let mut sub = layer.subscribe(&signed_in.session).await;
        assert!(matches!(sub.settled().await, AuthState::SignedIn(_)));

        layer.sign_out(&signed_in.session).await.unwrap();
        assert_eq!(sub.current(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_expired_session_is_signed_out() {
        let (layer, sessions) = layer();
        let session = SessionId::new("browser-1".to_string());
        let past = Utc::now() - Duration::hours(2);
        sessions
            .create_session(&Session {
                id: session.clone(),
                identity: Identity::apple_mock(),
                persistence: Persistence::Local,
                created_at: past,
                expires_at: past + Duration::hours(1),
            })
            .await
            .unwrap();

        let mut sub = layer.subscribe(&session).await;
        assert_eq!(sub.settled().await, AuthState::SignedOut);
        assert!(sessions.get_session(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_without_session_is_ok() {
        let (layer, _) = layer();
        assert!(layer
            .sign_out(&SessionId::new("nobody".to_string()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unknown_state_fails_completion() {
        let (layer, _) = layer();
        let result = layer
            .complete_redirect(RedirectCallback {
                state: "forged".to_string(),
                code: Some("good-code".to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidState)));
    }
}
