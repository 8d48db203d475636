//! `IdentityLayer` implementations, one per [`AuthStrategy`].

mod direct;
mod hub;
mod managed;
mod oidc;

use std::sync::Arc;

use signup_core::auth::{AuthStrategy, IdentityLayer, SessionRepository};

pub use direct::DirectRedirectLayer;
pub use managed::ManagedSessionLayer;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::providers::ProviderRegistry;
use oidc::OidcFlow;

/// Build the identity layer the configuration asks for.
///
/// # Errors
///
/// Returns `AuthError::Config` when no provider is configured, since such a
/// layer could never sign anyone in.
pub fn build_layer(
    config: &AuthConfig,
    providers: ProviderRegistry,
    sessions: Arc<dyn SessionRepository>,
) -> Result<Arc<dyn IdentityLayer>, AuthError> {
    if providers.is_empty() {
        return Err(AuthError::Config("no identity provider configured".to_string()));
    }

    let flow = OidcFlow::new(providers, sessions, config.flow_ttl);

    let layer: Arc<dyn IdentityLayer> = match config.strategy {
        AuthStrategy::Direct => Arc::new(DirectRedirectLayer::new(flow, config.session_ttl)),
        AuthStrategy::Managed => Arc::new(ManagedSessionLayer::new(
            flow,
            config.session_ttl,
            config.session_update_age,
        )),
    };

    tracing::info!(strategy = config.strategy.label(), "Identity layer initialized");
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::InMemorySessionStore;
    use crate::test_support::StubProvider;
    use signup_core::auth::OidcProvider;
    use url::Url;

    fn config(strategy: AuthStrategy) -> AuthConfig {
        AuthConfig::for_base_url(Url::parse("http://localhost:3000").unwrap())
            .with_strategy(strategy)
    }

    #[test]
    fn test_empty_registry_is_a_config_error() {
        let result = build_layer(
            &config(AuthStrategy::Direct),
            ProviderRegistry::new(),
            Arc::new(InMemorySessionStore::new()),
        );
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_strategy_selects_layer() {
        for strategy in [AuthStrategy::Direct, AuthStrategy::Managed] {
            let layer = build_layer(
                &config(strategy),
                ProviderRegistry::new().with(Arc::new(StubProvider::new(OidcProvider::Google))),
                Arc::new(InMemorySessionStore::new()),
            )
            .unwrap();
            assert_eq!(layer.strategy(), strategy);
        }
    }
}
