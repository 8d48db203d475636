use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};

use super::{AuthFlowState, Session, SessionId};

/// Generate a cryptographically random session ID.
pub fn generate_session_id() -> SessionId {
    let id: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    SessionId::new(id)
}

/// Generate a random state parameter for CSRF protection.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Check if a session has expired.
pub fn is_session_expired(session: &Session, now: DateTime<Utc>) -> bool {
    session.expires_at <= now
}

/// Calculate session expiry from creation time and TTL.
pub fn calculate_expiry(created_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    created_at + ttl
}

/// Check if a pending auth flow is too old to accept its callback.
pub fn is_flow_expired(flow: &AuthFlowState, now: DateTime<Utc>, ttl: Duration) -> bool {
    flow.created_at + ttl <= now
}

/// Whether a sliding session should have its expiry pushed forward.
///
/// The expiry is refreshed once the session has used up more than
/// `update_age` of its `ttl`, so active sessions are not rewritten on every
/// request.
pub fn needs_refresh(
    session: &Session,
    now: DateTime<Utc>,
    ttl: Duration,
    update_age: Duration,
) -> bool {
    let last_refresh = session.expires_at - ttl;
    now - last_refresh >= update_age
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{OidcProvider, Persistence};
    use crate::identity::{Identity, IdentityProviderKind};

    fn session_at(created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Session {
        Session {
            id: generate_session_id(),
            identity: Identity {
                provider: IdentityProviderKind::Google,
                uid: "user-1".to_string(),
                email: None,
                display_name: None,
            },
            persistence: Persistence::Local,
            created_at,
            expires_at,
        }
    }

    #[test]
    fn generate_session_id_produces_32_char_alphanumeric() {
        let id = generate_session_id();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generate_session_id_is_unique() {
        let id1 = generate_session_id();
        let id2 = generate_session_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn generate_state_produces_32_char_string() {
        let state = generate_state();
        assert_eq!(state.len(), 32);
    }

    #[test]
    fn is_session_expired_returns_false_for_future_expiry() {
        let now = Utc::now();
        let session = session_at(now, now + Duration::hours(1));
        assert!(!is_session_expired(&session, now));
    }

    #[test]
    fn is_session_expired_returns_true_at_exact_expiry() {
        let now = Utc::now();
        let session = session_at(now - Duration::hours(1), now);
        assert!(is_session_expired(&session, now));
    }

    #[test]
    fn calculate_expiry_adds_ttl_to_created_at() {
        let created = Utc::now();
        let ttl = Duration::days(7);
        assert_eq!(calculate_expiry(created, ttl), created + ttl);
    }

    #[test]
    fn is_flow_expired_respects_ttl() {
        let now = Utc::now();
        let flow = AuthFlowState {
            pkce_verifier: "v".to_string(),
            provider: OidcProvider::Apple,
            session_id: generate_session_id(),
            persistence: Persistence::Local,
            created_at: now - Duration::minutes(11),
        };
        assert!(is_flow_expired(&flow, now, Duration::minutes(10)));
        assert!(!is_flow_expired(&flow, now, Duration::minutes(15)));
    }

    #[test]
    fn needs_refresh_after_update_age() {
        let now = Utc::now();
        let ttl = Duration::days(7);
        // Last refreshed two days ago.
        let session = session_at(now - Duration::days(2), now - Duration::days(2) + ttl);
        assert!(needs_refresh(&session, now, ttl, Duration::days(1)));
        assert!(!needs_refresh(&session, now, ttl, Duration::days(3)));
    }
}
