//! Deterministic provider used by the unit tests.

use async_trait::async_trait;
use signup_core::auth::{AuthError, OidcClaims, OidcProvider, OidcProviderClient, Result};
use url::Url;

/// Provider that never touches the network.
///
/// `exchange_code` accepts `"good-code"` and rejects anything else.
pub struct StubProvider {
    provider: OidcProvider,
}

impl StubProvider {
    pub fn new(provider: OidcProvider) -> Self {
        Self { provider }
    }

    /// Pull the CSRF state back out of an authorization URL.
    pub fn state_from(url: &Url) -> String {
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OidcProviderClient for StubProvider {
    async fn authorization_url(&self, state: &str, pkce_challenge: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("https://{}.example.com/authorize", self.provider))
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("state", state)
            .append_pair("code_challenge", pkce_challenge);
        Ok(url)
    }

    async fn exchange_code(&self, code: &str, _pkce_verifier: &str) -> Result<OidcClaims> {
        if code != "good-code" {
            return Err(AuthError::CodeExchange("invalid_grant".to_string()));
        }

        Ok(OidcClaims {
            subject: format!("stub-{}-user", self.provider),
            email: Some(format!("user@{}.example.com", self.provider)),
            name: Some("Stub User".to_string()),
            provider: self.provider,
        })
    }

    fn provider(&self) -> OidcProvider {
        self.provider
    }
}
