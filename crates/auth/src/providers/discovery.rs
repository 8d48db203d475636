//! OIDC discovery and token handling shared by the real providers.

use openidconnect::{
    core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata, CoreTokenResponse},
    reqwest, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet, EndpointNotSet, EndpointSet,
    IssuerUrl, Nonce, RedirectUrl, Scope, TokenResponse,
};
use signup_core::auth::{generate_state, AuthError, OidcClaims, OidcProvider, Result};
use url::Url;

/// Type alias for a CoreClient configured from provider metadata.
///
/// `from_provider_metadata` returns a client with:
/// - HasAuthUrl = EndpointSet (always set from discovery)
/// - HasDeviceAuthUrl = EndpointNotSet
/// - HasIntrospectionUrl = EndpointNotSet
/// - HasRevocationUrl = EndpointNotSet
/// - HasTokenUrl = EndpointMaybeSet (may or may not be in discovery)
/// - HasUserInfoUrl = EndpointMaybeSet (may or may not be in discovery)
///
/// Calling `set_redirect_uri` preserves these type parameters.
pub(crate) type ConfiguredCoreClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// HTTP client without redirect following (security requirement).
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| AuthError::Provider(format!("Failed to build HTTP client: {}", e)))
}

/// Discover the issuer's metadata and build a client for it.
pub(crate) async fn discover(
    issuer: &str,
    http_client: &reqwest::Client,
    client_id: &str,
    client_secret: Option<&str>,
    redirect_uri: &Url,
) -> Result<ConfiguredCoreClient> {
    let issuer_url =
        IssuerUrl::new(issuer.to_string()).map_err(|e| AuthError::Provider(e.to_string()))?;

    let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, http_client)
        .await
        .map_err(|e| AuthError::Provider(e.to_string()))?;

    tracing::debug!(issuer, "OIDC metadata discovered");

    Ok(CoreClient::from_provider_metadata(
        provider_metadata,
        ClientId::new(client_id.to_string()),
        client_secret.map(|s| ClientSecret::new(s.to_string())),
    )
    .set_redirect_uri(
        RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| AuthError::Provider(e.to_string()))?,
    ))
}

/// Build the authorization URL with a pre-computed PKCE challenge.
///
/// `extra` is appended verbatim after the PKCE parameters.
pub(crate) fn authorize_url(
    client: &ConfiguredCoreClient,
    state: &str,
    pkce_challenge: &str,
    scopes: &[&str],
    extra: &[(&'static str, &'static str)],
) -> Url {
    let state_owned = state.to_string();

    let mut request = client.authorize_url(
        CoreAuthenticationFlow::AuthorizationCode,
        move || CsrfToken::new(state_owned),
        || Nonce::new(generate_state()),
    );

    for scope in scopes {
        request = request.add_scope(Scope::new((*scope).to_string()));
    }

    request = request
        .add_extra_param("code_challenge", pkce_challenge.to_string())
        .add_extra_param("code_challenge_method", "S256");

    for (name, value) in extra {
        request = request.add_extra_param(*name, *value);
    }

    let (auth_url, _csrf_token, _nonce) = request.url();
    auth_url
}

/// Verify the ID token in a token response and pull out the claims we keep.
pub(crate) fn claims_from_response(
    client: &ConfiguredCoreClient,
    token_response: &CoreTokenResponse,
    provider: OidcProvider,
) -> Result<OidcClaims> {
    let id_token = token_response
        .id_token()
        .ok_or_else(|| AuthError::InvalidToken("No ID token in response".to_string()))?;

    let claims = id_token
        .claims(&client.id_token_verifier(), |_: Option<&Nonce>| Ok(()))
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(OidcClaims {
        subject: claims.subject().to_string(),
        email: claims.email().map(|e| e.to_string()),
        name: claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.to_string()),
        provider,
    })
}
