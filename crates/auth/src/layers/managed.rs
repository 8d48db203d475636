//! Identity layer where the server owns a sliding, always-persistent session.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use signup_core::auth::{
    calculate_expiry, generate_session_id, is_session_expired, needs_refresh, AuthError,
    AuthState, AuthStateSubscription, AuthStrategy, IdentityLayer, OidcProvider, Persistence,
    RedirectCallback, RedirectOutcome, Result, Session, SessionId, SessionRepository, SignedIn,
};
use url::Url;

use super::hub::AuthStateHub;
use super::oidc::OidcFlow;

pub struct ManagedSessionLayer {
    flow: OidcFlow,
    hub: AuthStateHub,
    policy: SlidingExpiry,
}

/// Session lifetime, re-stamped once a session is `update_age` old.
#[derive(Clone, Copy)]
struct SlidingExpiry {
    ttl: Duration,
    update_age: Duration,
}

impl ManagedSessionLayer {
    pub(crate) fn new(
        flow: OidcFlow,
        session_ttl: std::time::Duration,
        update_age: std::time::Duration,
    ) -> Self {
        Self {
            flow,
            hub: AuthStateHub::new(),
            policy: SlidingExpiry {
                ttl: Duration::seconds(session_ttl.as_secs() as i64),
                update_age: Duration::seconds(update_age.as_secs() as i64),
            },
        }
    }

    fn sessions(&self) -> Arc<dyn SessionRepository> {
        self.flow.sessions().clone()
    }
}

/// Look a session up, pushing its expiry forward when it is due.
async fn lookup(
    sessions: Arc<dyn SessionRepository>,
    id: SessionId,
    policy: SlidingExpiry,
) -> AuthState {
    let now = Utc::now();
    let session = match sessions.get_session(&id).await {
        Ok(Some(session)) => session,
        Ok(None) => return AuthState::SignedOut,
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed");
            return AuthState::SignedOut;
        }
    };

    if is_session_expired(&session, now) {
        if let Err(e) = sessions.delete_session(&id).await {
            tracing::warn!(error = %e, "Failed to delete expired session");
        }
        return AuthState::SignedOut;
    }

    if needs_refresh(&session, now, policy.ttl, policy.update_age) {
        let refreshed = Session {
            expires_at: calculate_expiry(now, policy.ttl),
            ..session.clone()
        };
        match sessions.create_session(&refreshed).await {
            Ok(()) => tracing::debug!(session = %id, "Session expiry refreshed"),
            Err(e) => tracing::warn!(error = %e, "Failed to refresh session expiry"),
        }
    }

    AuthState::SignedIn(session.identity)
}

#[async_trait]
impl IdentityLayer for ManagedSessionLayer {
    fn strategy(&self) -> AuthStrategy {
        AuthStrategy::Managed
    }

    async fn set_persistence(
        &self,
        _session: &SessionId,
        persistence: Persistence,
    ) -> Result<Persistence> {
        if persistence != Persistence::Local {
            tracing::debug!(%persistence, "Managed sessions are always local");
        }
        Ok(Persistence::Local)
    }

    async fn start_redirect(
        &self,
        session: &SessionId,
        provider: OidcProvider,
        _persistence: Persistence,
    ) -> Result<Url> {
        self.flow.start(session, provider, Persistence::Local).await
    }

    async fn complete_redirect(&self, callback: RedirectCallback) -> Result<SessionId> {
        let completed = self.flow.complete(callback).await?;

        let outcome = match completed.result {
            Ok(identity) => {
                let now = Utc::now();
                let session = Session {
                    id: generate_session_id(),
                    identity: identity.clone(),
                    persistence: Persistence::Local,
                    created_at: now,
                    expires_at: calculate_expiry(now, self.policy.ttl),
                };
                self.sessions().create_session(&session).await?;
                self.hub
                    .publish(&session.id, AuthState::SignedIn(identity.clone()));
                tracing::info!(provider = %completed.provider, uid = %identity.uid, "User signed in");
                RedirectOutcome::Success(SignedIn {
                    session: session.id,
                    persistence: Persistence::Local,
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
            .subscribe(session, lookup(self.sessions(), session.clone(), self.policy))
    }

    /// Revokes the server session. Signing out a session that does not exist
    /// is an error.
    async fn sign_out(&self, session: &SessionId) -> Result<()> {
        let sessions = self.sessions();
        if sessions.get_session(session).await?.is_none() {
            return Err(AuthError::SessionNotFound);
        }

        sessions.delete_session(session).await?;
        self.hub.publish(session, AuthState::SignedOut);
        tracing::info!(session = %session, "Session revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderRegistry;
    use crate::sessions::InMemorySessionStore;
    use crate::test_support::StubProvider;
    use signup_core::identity::Identity;

    const DAY: u64 = 24 * 60 * 60;

    fn layer() -> (ManagedSessionLayer, Arc<InMemorySessionStore>) {
        let sessions = Arc::new(InMemorySessionStore::new());
        let providers =
            ProviderRegistry::new().with(Arc::new(StubProvider::new(OidcProvider::Apple)));
        let flow = OidcFlow::new(providers, sessions.clone(), std::time::Duration::from_secs(600));
        (
            ManagedSessionLayer::new(
                flow,
                std::time::Duration::from_secs(7 * DAY),
                std::time::Duration::from_secs(DAY),
            ),
            sessions,
        )
    }

    fn stored_session(id: &SessionId, last_refresh_days_ago: i64) -> Session {
        let last_refresh = Utc::now() - Duration::days(last_refresh_days_ago);
        Session {
            id: id.clone(),
            identity: Identity::apple_mock(),
            persistence: Persistence::Local,
            created_at: last_refresh,
            expires_at: last_refresh + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn test_persistence_is_always_local() {
        let (layer, _) = layer();
        let effective = layer
            .set_persistence(&SessionId::new("b".to_string()), Persistence::Session)
            .await
            .unwrap();
        assert_eq!(effective, Persistence::Local);
    }

    #[tokio::test]
    async fn test_complete_creates_local_session() {
        let (layer, sessions) = layer();
        let session = SessionId::new("browser-1".to_string());
        let url = layer
            .start_redirect(&session, OidcProvider::Apple, Persistence::Session)
            .await
            .unwrap();

        layer
            .complete_redirect(RedirectCallback {
                state: StubProvider::state_from(&url),
                code: Some("good-code".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let signed_in = layer.get_redirect_result(&session).await.unwrap().unwrap();
        assert_ne!(signed_in.session, session);
        assert_eq!(signed_in.persistence, Persistence::Local);
        assert!(sessions.get_session(&session).await.unwrap().is_none());

        let stored = sessions
            .get_session(&signed_in.session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.persistence, Persistence::Local);
        assert_eq!(stored.identity.uid, "stub-apple-user");
    }

    #[tokio::test]
    async fn test_old_session_is_refreshed_on_lookup() {
        let (layer, sessions) = layer();
        let session = SessionId::new("browser-1".to_string());
        let original = stored_session(&session, 2);
        sessions.create_session(&original).await.unwrap();

        let mut sub = layer.subscribe(&session).await;
        assert!(matches!(sub.settled().await, AuthState::SignedIn(_)));

        let stored = sessions.get_session(&session).await.unwrap().unwrap();
        assert!(stored.expires_at > original.expires_at);
    }

    #[tokio::test]
    async fn test_fresh_session_is_not_rewritten() {
        let (layer, sessions) = layer();
        let session = SessionId::new("browser-1".to_string());
        let original = stored_session(&session, 0);
        sessions.create_session(&original).await.unwrap();

        let mut sub = layer.subscribe(&session).await;
        sub.settled().await;

        let stored = sessions.get_session(&session).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, original.expires_at);
    }

    #[tokio::test]
    async fn test_sign_out_without_session_errors() {
        let (layer, _) = layer();
        let result = layer.sign_out(&SessionId::new("nobody".to_string())).await;
        assert!(matches!(result, Err(AuthError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_session() {
        let (layer, sessions) = layer();
        let session = SessionId::new("browser-1".to_string());
        sessions
            .create_session(&stored_session(&session, 0))
            .await
            .unwrap();

        layer.sign_out(&session).await.unwrap();
        assert!(sessions.get_session(&session).await.unwrap().is_none());
    }
}
