//! Apple OIDC provider implementation.
//!
//! Apple Sign In requires a signed JWT as the client secret, generated using
//! the team's ES256 private key, and answers the callback with a form POST.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use openidconnect::{reqwest, AuthorizationCode, PkceCodeVerifier};
use serde::Serialize;
use signup_core::auth::{AuthError, OidcClaims, OidcProvider, OidcProviderClient, Result};
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

use super::discovery::{self, ConfiguredCoreClient};
use crate::config::AppleConfig;

const ISSUER: &str = "https://appleid.apple.com";

/// Apple caps client secret lifetime at six months.
const CLIENT_SECRET_TTL_SECS: u64 = 86400 * 180;

/// Apple OIDC provider.
pub struct AppleProvider {
    client: ConfiguredCoreClient,
    http_client: reqwest::Client,
    config: AppleConfig,
}

impl AppleProvider {
    /// Create a new Apple provider by discovering the OIDC metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails or the redirect URI is invalid.
    pub async fn new(config: &AppleConfig) -> Result<Self> {
        let http_client = discovery::http_client()?;
        // The client secret is generated per-request in exchange_code.
        let client = discovery::discover(
            ISSUER,
            &http_client,
            &config.client_id,
            None,
            &config.redirect_uri,
        )
        .await?;

        Ok(Self {
            client,
            http_client,
            config: config.clone(),
        })
    }

    /// Generate Apple client secret (signed JWT).
    ///
    /// See: <https://developer.apple.com/documentation/sign_in_with_apple/generate_and_validate_tokens>
    fn generate_client_secret(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthError::Provider("System clock before UNIX epoch".to_string()))?
            .as_secs();

        sign_client_secret(&self.config, now)
    }
}

#[derive(Serialize)]
struct ClientSecretClaims<'a> {
    iss: &'a str,
    iat: u64,
    exp: u64,
    aud: &'a str,
    sub: &'a str,
}

fn sign_client_secret(config: &AppleConfig, now: u64) -> Result<String> {
    let claims = ClientSecretClaims {
        iss: &config.team_id,
        iat: now,
        exp: now + CLIENT_SECRET_TTL_SECS,
        aud: ISSUER,
        sub: &config.client_id,
    };

    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(config.key_id.clone());

    let key = EncodingKey::from_ec_pem(config.private_key.as_bytes())
        .map_err(|e| AuthError::Provider(format!("Invalid Apple private key: {}", e)))?;

    encode(&header, &claims, &key)
        .map_err(|e| AuthError::Provider(format!("Failed to sign Apple JWT: {}", e)))
}

#[async_trait]
impl OidcProviderClient for AppleProvider {
    async fn authorization_url(&self, state: &str, pkce_challenge: &str) -> Result<Url> {
        // Apple only releases name/email scopes with response_mode=form_post.
        Ok(discovery::authorize_url(
            &self.client,
            state,
            pkce_challenge,
            &["openid", "email", "name"],
            &[("response_mode", "form_post")],
        ))
    }

    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<OidcClaims> {
        let client_secret = self.generate_client_secret()?;

        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| AuthError::CodeExchange(e.to_string()))?
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .add_extra_param("client_secret", &client_secret)
            .request_async(&self.http_client)
            .await
            .map_err(|e| AuthError::CodeExchange(e.to_string()))?;

        discovery::claims_from_response(&self.client, &token_response, OidcProvider::Apple)
    }

    fn provider(&self) -> OidcProvider {
        OidcProvider::Apple
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_client_secret_rejects_invalid_key() {
        let config = AppleConfig {
            client_id: "com.example.signup".to_string(),
            team_id: "TEAM123456".to_string(),
            key_id: "KEY1234567".to_string(),
            private_key: "not a pem".to_string(),
            redirect_uri: Url::parse("http://localhost:3000/auth/apple/callback").unwrap(),
        };

        let err = sign_client_secret(&config, 1_700_000_000).unwrap_err();
        assert!(err.to_string().contains("Invalid Apple private key"));
    }
}
