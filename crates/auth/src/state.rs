//! Application state for auth.

use std::sync::Arc;

use axum::extract::FromRef;
use signup_core::auth::{IdentityLayer, SessionRepository};
use signup_core::tab::TabStorage;

use crate::busy::BusyFlags;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::layers::build_layer;
use crate::providers::ProviderRegistry;

/// Shared state for auth handlers and pages.
///
/// `layer` is `None` when the identity layer could not be initialized. The
/// pages stay up and report the missing configuration instead.
#[derive(Clone)]
pub struct AuthState {
    layer: Option<Arc<dyn IdentityLayer>>,
    pub tabs: Arc<dyn TabStorage>,
    pub config: AuthConfig,
    pub busy: BusyFlags,
}

impl AuthState {
    /// Discover the configured providers and build the identity layer.
    ///
    /// Initialization failures are logged, never returned.
    pub async fn new(
        config: AuthConfig,
        sessions: Arc<dyn SessionRepository>,
        tabs: Arc<dyn TabStorage>,
    ) -> Self {
        let layer = match ProviderRegistry::from_config(&config).await {
            Ok(providers) => build_layer(&config, providers, sessions),
            Err(e) => Err(e),
        };
        Self::from_layer_result(config, layer, tabs)
    }

    /// Build the identity layer from already constructed provider clients.
    pub fn with_providers(
        config: AuthConfig,
        providers: ProviderRegistry,
        sessions: Arc<dyn SessionRepository>,
        tabs: Arc<dyn TabStorage>,
    ) -> Self {
        let layer = build_layer(&config, providers, sessions);
        Self::from_layer_result(config, layer, tabs)
    }

    fn from_layer_result(
        config: AuthConfig,
        layer: Result<Arc<dyn IdentityLayer>, AuthError>,
        tabs: Arc<dyn TabStorage>,
    ) -> Self {
        let layer = match layer {
            Ok(layer) => Some(layer),
            Err(e) => {
                tracing::error!(error = %e, "Identity layer unavailable, sign-in disabled");
                None
            }
        };

        Self {
            layer,
            tabs,
            config,
            busy: BusyFlags::new(),
        }
    }

    /// The identity layer.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if it failed to start.
    pub fn layer(&self) -> Result<&Arc<dyn IdentityLayer>, AuthError> {
        self.layer.as_ref().ok_or(AuthError::NotInitialized)
    }

    pub fn is_ready(&self) -> bool {
        self.layer.is_some()
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}
