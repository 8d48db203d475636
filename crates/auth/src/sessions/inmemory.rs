//! In-memory session storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use signup_core::auth::{
    is_session_expired, AuthFlowState, RedirectOutcome, Result, Session, SessionId,
    SessionRepository,
};

/// How long an unredeemed flow or an unread outcome is kept.
pub const DEFAULT_RETENTION: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// In-memory session store for development and testing.
///
/// Stores sessions, auth flow state and parked redirect outcomes in HashMaps
/// wrapped in `Arc<RwLock<_>>`. Data is lost when the process exits.
///
/// Abandoned flows and unread outcomes are dropped once older than the
/// retention window, and expired sessions once past their expiry. Pruning
/// runs on every insert into the matching map.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    auth_flows: Arc<RwLock<HashMap<String, AuthFlowState>>>,
    outcomes: Arc<RwLock<HashMap<String, ParkedOutcome>>>,
    retention: Duration,
}

#[derive(Debug, Clone)]
struct ParkedOutcome {
    outcome: RedirectOutcome,
    parked_at: DateTime<Utc>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl InMemorySessionStore {
    /// Creates a new empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that drops flows and outcomes older than `retention`.
    pub fn with_retention(retention: std::time::Duration) -> Self {
        Self {
            sessions: Arc::default(),
            auth_flows: Arc::default(),
            outcomes: Arc::default(),
            retention: Duration::seconds(retention.as_secs() as i64),
        }
    }

    #[cfg(test)]
    pub(crate) async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn pending_flow_count(&self) -> usize {
        self.auth_flows.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn parked_outcome_count(&self) -> usize {
        self.outcomes.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !is_session_expired(s, now));
        sessions.insert(session.id.as_str().to_string(), session.clone());
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id.as_str()).cloned())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id.as_str());
        Ok(())
    }

    async fn store_auth_flow(&self, state: &str, flow: &AuthFlowState) -> Result<()> {
        let cutoff = Utc::now() - self.retention;
        let mut flows = self.auth_flows.write().await;
        flows.retain(|_, f| f.created_at > cutoff);
        flows.insert(state.to_string(), flow.clone());
        Ok(())
    }

    async fn take_auth_flow(&self, state: &str) -> Result<Option<AuthFlowState>> {
        let mut flows = self.auth_flows.write().await;
        Ok(flows.remove(state))
    }

    async fn store_outcome(&self, session: &SessionId, outcome: &RedirectOutcome) -> Result<()> {
        let now = Utc::now();
        let cutoff = now - self.retention;
        let mut outcomes = self.outcomes.write().await;
        outcomes.retain(|_, parked| parked.parked_at > cutoff);
        outcomes.insert(
            session.as_str().to_string(),
            ParkedOutcome {
                outcome: outcome.clone(),
                parked_at: now,
            },
        );
        Ok(())
    }

    async fn take_outcome(&self, session: &SessionId) -> Result<Option<RedirectOutcome>> {
        let mut outcomes = self.outcomes.write().await;
        Ok(outcomes.remove(session.as_str()).map(|parked| parked.outcome))
    }
}
