//! SQLite session storage implementation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use signup_core::auth::{
    AuthError, AuthFlowState, OidcProvider, Persistence, RedirectOutcome, Result, Session,
    SessionId, SessionRepository,
};
use signup_core::identity::Identity;
use sqlx::SqlitePool;

use super::inmemory::DEFAULT_RETENTION;

/// SQLite-backed session storage.
///
/// Flows and outcomes older than the retention window, and expired sessions,
/// are deleted whenever a row of the same kind is written.
pub struct SqliteSessionStore {
    pool: SqlitePool,
    retention: Duration,
}

impl SqliteSessionStore {
    /// Creates a new SQLite session store.
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_retention(pool, DEFAULT_RETENTION)
    }

    pub fn with_retention(pool: SqlitePool, retention: std::time::Duration) -> Self {
        Self {
            pool,
            retention: Duration::seconds(retention.as_secs() as i64),
        }
    }

    fn cutoff(&self) -> String {
        (Utc::now() - self.retention).to_rfc3339()
    }

    /// Runs database migrations to create required tables.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                identity TEXT NOT NULL,
                persistence TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);

            CREATE TABLE IF NOT EXISTS auth_flows (
                state TEXT PRIMARY KEY,
                pkce_verifier TEXT NOT NULL,
                provider TEXT NOT NULL,
                session_id TEXT NOT NULL,
                persistence TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_auth_flows_created_at ON auth_flows(created_at);

            CREATE TABLE IF NOT EXISTS redirect_outcomes (
                session_id TEXT PRIMARY KEY,
                outcome TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_redirect_outcomes_created_at ON redirect_outcomes(created_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }
}

fn storage(e: impl std::fmt::Display) -> AuthError {
    AuthError::Storage(e.to_string())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(storage)?
        .with_timezone(&Utc))
}

#[async_trait]
impl SessionRepository for SqliteSessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        let identity = serde_json::to_string(&session.identity).map_err(storage)?;

        sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        sqlx::query(
            "INSERT OR REPLACE INTO sessions (id, identity, persistence, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.id.as_str())
        .bind(identity)
        .bind(session.persistence.to_string())
        .bind(session.created_at.to_rfc3339())
        .bind(session.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT id, identity, persistence, created_at, expires_at FROM sessions WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        match row {
            Some((id, identity, persistence, created_at, expires_at)) => {
                let identity: Identity = serde_json::from_str(&identity).map_err(storage)?;
                let persistence: Persistence = persistence.parse().map_err(AuthError::Storage)?;

                Ok(Some(Session {
                    id: SessionId::new(id),
                    identity,
                    persistence,
                    created_at: parse_timestamp(&created_at)?,
                    expires_at: parse_timestamp(&expires_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        Ok(())
    }

    async fn store_auth_flow(&self, state: &str, flow: &AuthFlowState) -> Result<()> {
        sqlx::query("DELETE FROM auth_flows WHERE created_at < ?")
            .bind(self.cutoff())
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        sqlx::query(
            "INSERT OR REPLACE INTO auth_flows (state, pkce_verifier, provider, session_id, persistence, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(state)
        .bind(&flow.pkce_verifier)
        .bind(flow.provider.to_string())
        .bind(flow.session_id.as_str())
        .bind(flow.persistence.to_string())
        .bind(flow.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn take_auth_flow(&self, state: &str) -> Result<Option<AuthFlowState>> {
        // SELECT and DELETE share a transaction so a state is redeemed once.
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let row = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT pkce_verifier, provider, session_id, persistence, created_at FROM auth_flows WHERE state = ?",
        )
        .bind(state)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;

        if row.is_some() {
            sqlx::query("DELETE FROM auth_flows WHERE state = ?")
                .bind(state)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;

        match row {
            Some((pkce_verifier, provider, session_id, persistence, created_at)) => {
                let provider: OidcProvider = provider.parse().map_err(AuthError::Storage)?;
                let persistence: Persistence = persistence.parse().map_err(AuthError::Storage)?;

                Ok(Some(AuthFlowState {
                    pkce_verifier,
                    provider,
                    session_id: SessionId::new(session_id),
                    persistence,
                    created_at: parse_timestamp(&created_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn store_outcome(&self, session: &SessionId, outcome: &RedirectOutcome) -> Result<()> {
        let outcome = serde_json::to_string(outcome).map_err(storage)?;

        sqlx::query("DELETE FROM redirect_outcomes WHERE created_at < ?")
            .bind(self.cutoff())
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        sqlx::query(
            "INSERT OR REPLACE INTO redirect_outcomes (session_id, outcome, created_at) VALUES (?, ?, ?)",
        )
        .bind(session.as_str())
        .bind(outcome)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn take_outcome(&self, session: &SessionId) -> Result<Option<RedirectOutcome>> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let row = sqlx::query_as::<_, (String,)>(
            "SELECT outcome FROM redirect_outcomes WHERE session_id = ?",
        )
        .bind(session.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;

        if row.is_some() {
            sqlx::query("DELETE FROM redirect_outcomes WHERE session_id = ?")
                .bind(session.as_str())
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;

        row.map(|(outcome,)| serde_json::from_str(&outcome).map_err(storage))
            .transpose()
    }
}
