//! OIDC provider implementations.
//!
//! This module contains implementations of `OidcProviderClient` for:
//! - Google
//! - Apple (with JWT client secret generation)
//! - A development mock backed by the mock IdP (`mock` feature)

mod apple;
mod discovery;
mod google;
#[cfg(feature = "mock")]
mod mock;

use std::sync::Arc;

use signup_core::auth::{OidcProvider, OidcProviderClient};

pub use apple::AppleProvider;
pub use google::GoogleProvider;
#[cfg(feature = "mock")]
pub use mock::MockProvider;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// The provider clients available to an identity layer.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    google: Option<Arc<dyn OidcProviderClient>>,
    apple: Option<Arc<dyn OidcProviderClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under the provider it reports.
    pub fn with(mut self, client: Arc<dyn OidcProviderClient>) -> Self {
        match client.provider() {
            OidcProvider::Google => self.google = Some(client),
            OidcProvider::Apple => self.apple = Some(client),
        }
        self
    }

    /// Build clients for every provider present in the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if provider initialization fails (e.g., OIDC discovery).
    #[cfg(not(feature = "mock"))]
    pub async fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let mut registry = Self::new();

        if let Some(ref cfg) = config.google {
            registry = registry.with(Arc::new(GoogleProvider::new(cfg).await?));
        }

        if let Some(ref cfg) = config.apple {
            registry = registry.with(Arc::new(AppleProvider::new(cfg).await?));
        }

        Ok(registry)
    }

    /// Mock clients for every configured provider, pointed at the mock IdP.
    #[cfg(feature = "mock")]
    pub async fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let mut registry = Self::new();

        if config.google.is_some() {
            registry = registry.with(Arc::new(MockProvider::new(
                OidcProvider::Google,
                config.mock_idp_url.clone(),
                config.callback_url("google")?,
            )));
        }

        if config.apple.is_some() {
            registry = registry.with(Arc::new(MockProvider::new(
                OidcProvider::Apple,
                config.mock_idp_url.clone(),
                config.callback_url("apple")?,
            )));
        }

        Ok(registry)
    }

    /// Gets the client for the given provider.
    ///
    /// # Errors
    ///
    /// Returns `ProviderNotConfigured` if the provider is not enabled.
    pub fn get(&self, provider: OidcProvider) -> Result<&dyn OidcProviderClient, AuthError> {
        let client = match provider {
            OidcProvider::Google => self.google.as_deref(),
            OidcProvider::Apple => self.apple.as_deref(),
        };
        client.ok_or_else(|| AuthError::ProviderNotConfigured(provider.label().to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.google.is_none() && self.apple.is_none()
    }

    pub fn has(&self, provider: OidcProvider) -> bool {
        self.get(provider).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubProvider;

    #[test]
    fn test_registry_routes_by_provider() {
        let registry = ProviderRegistry::new().with(Arc::new(StubProvider::new(OidcProvider::Apple)));

        assert!(registry.has(OidcProvider::Apple));
        assert!(!registry.has(OidcProvider::Google));
        assert!(!registry.is_empty());
        assert_eq!(
            registry.get(OidcProvider::Apple).unwrap().provider(),
            OidcProvider::Apple
        );
    }

    #[test]
    fn test_registry_missing_provider() {
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get(OidcProvider::Google),
            Err(AuthError::ProviderNotConfigured(name)) if name == "Google"
        ));
    }
}
