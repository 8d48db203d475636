//! Development OIDC provider backed by the mock IdP server.
//!
//! The authorization URL points at [`MockIdpServer`](crate::mock_idp::MockIdpServer)
//! and the "authorization code" it hands back is base64 JSON carrying the
//! identity typed into its login form.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use signup_core::auth::{AuthError, OidcClaims, OidcProvider, OidcProviderClient, Result};
use url::Url;

/// Payload encoded into a mock authorization code.
#[derive(Deserialize)]
struct MockCode {
    provider: OidcProvider,
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

/// Mock OIDC provider that works with MockIdpServer.
pub struct MockProvider {
    provider: OidcProvider,
    mock_idp_url: Url,
    redirect_uri: Url,
}

impl MockProvider {
    /// Create a new MockProvider.
    ///
    /// # Arguments
    /// * `provider` - The OIDC provider to simulate (Google or Apple)
    /// * `mock_idp_url` - The URL of the Mock IdP server (e.g., http://localhost:3001)
    /// * `redirect_uri` - The callback URL for the main app
    pub fn new(provider: OidcProvider, mock_idp_url: Url, redirect_uri: Url) -> Self {
        Self {
            provider,
            mock_idp_url,
            redirect_uri,
        }
    }

    /// Encode a code the way the mock IdP does.
    pub fn encode_code(
        provider: OidcProvider,
        sub: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> String {
        base64::engine::general_purpose::STANDARD.encode(
            serde_json::json!({
                "provider": provider,
                "sub": sub,
                "email": email,
                "name": name,
            })
            .to_string(),
        )
    }
}

#[async_trait]
impl OidcProviderClient for MockProvider {
    async fn authorization_url(&self, state: &str, _pkce_challenge: &str) -> Result<Url> {
        let mut url = self
            .mock_idp_url
            .join(&format!("/{}/authorize", self.provider))
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("state", state)
            .append_pair("redirect_uri", self.redirect_uri.as_str());

        Ok(url)
    }

    async fn exchange_code(&self, code: &str, _pkce_verifier: &str) -> Result<OidcClaims> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(code)
            .map_err(|e| AuthError::CodeExchange(e.to_string()))?;

        let payload: MockCode =
            serde_json::from_slice(&decoded).map_err(|e| AuthError::CodeExchange(e.to_string()))?;

        if payload.provider != self.provider {
            return Err(AuthError::CodeExchange(format!(
                "code issued for {} presented to {}",
                payload.provider, self.provider
            )));
        }

        Ok(OidcClaims {
            subject: payload.sub,
            email: payload.email,
            name: payload.name,
            provider: payload.provider,
        })
    }

    fn provider(&self) -> OidcProvider {
        self.provider
    }
}
