//! Typed access to the values a page keeps in tab storage.

use std::sync::Arc;

use chrono::Local;
use signup_core::auth::OidcProvider;
use signup_core::identity::Identity;
use signup_core::tab::{
    AttemptMarker, DebugTrail, TabId, TabStorage, AUTH_ATTEMPT_KEY, DEBUG_LINES_KEY,
    LAST_PROVIDER_KEY, MOCK_APPLE_USER_KEY,
};

/// One browser tab's storage.
///
/// Storage failures are logged and treated as missing values: nothing kept
/// here is worth failing a page render over.
#[derive(Clone)]
pub struct BrowserTab {
    storage: Arc<dyn TabStorage>,
    id: TabId,
}

impl BrowserTab {
    pub fn new(storage: Arc<dyn TabStorage>, id: TabId) -> Self {
        Self { storage, id }
    }

    pub fn id(&self) -> &TabId {
        &self.id
    }

    async fn get(&self, key: &str) -> Option<String> {
        match self.storage.get(&self.id, key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(tab = %self.id, key, error = %e, "Tab storage read failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String) {
        if let Err(e) = self.storage.set(&self.id, key, value).await {
            tracing::warn!(tab = %self.id, key, error = %e, "Tab storage write failed");
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove(&self.id, key).await {
            tracing::warn!(tab = %self.id, key, error = %e, "Tab storage remove failed");
        }
    }

    /// Write the attempt and last-provider markers.
    pub async fn record_attempt(&self, provider: OidcProvider) {
        let marker = AttemptMarker::new(provider);
        self.set(AUTH_ATTEMPT_KEY, marker.to_stored()).await;
        self.set(LAST_PROVIDER_KEY, marker.to_stored()).await;
    }

    pub async fn attempt(&self) -> Option<AttemptMarker> {
        self.get(AUTH_ATTEMPT_KEY)
            .await
            .and_then(|value| AttemptMarker::from_stored(&value))
    }

    pub async fn last_provider(&self) -> Option<String> {
        self.get(LAST_PROVIDER_KEY)
            .await
            .filter(|value| !value.is_empty())
    }

    pub async fn clear_markers(&self) {
        self.remove(AUTH_ATTEMPT_KEY).await;
        self.remove(LAST_PROVIDER_KEY).await;
    }

    /// The identity left by the Apple mock round trip, if any.
    ///
    /// A record that no longer parses is ignored.
    pub async fn mock_user(&self) -> Option<Identity> {
        let raw = self.get(MOCK_APPLE_USER_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(tab = %self.id, error = %e, "Ignoring unreadable mock user record");
                None
            }
        }
    }

    pub async fn store_mock_user(&self, identity: &Identity) {
        match serde_json::to_string(identity) {
            Ok(json) => self.set(MOCK_APPLE_USER_KEY, json).await,
            Err(e) => tracing::warn!(error = %e, "Failed to serialize mock user"),
        }
    }

    /// Forget everything this tab stored: mock record, markers and trail.
    pub async fn clear(&self) {
        if let Err(e) = self.storage.clear(&self.id).await {
            tracing::warn!(tab = %self.id, error = %e, "Tab storage clear failed");
        }
    }

    pub async fn debug_trail(&self) -> DebugTrail {
        self.get(DEBUG_LINES_KEY)
            .await
            .map(|raw| DebugTrail::from_json(&raw))
            .unwrap_or_default()
    }

    /// Append a line stamped with the local wall-clock time.
    pub async fn debug(&self, message: impl AsRef<str>) {
        tracing::debug!(tab = %self.id, "{}", message.as_ref());
        let mut trail = self.debug_trail().await;
        trail.push(Local::now().time(), message);
        self.set(DEBUG_LINES_KEY, trail.to_json()).await;
    }

    pub async fn reset_debug(&self) {
        self.remove(DEBUG_LINES_KEY).await;
    }
}
