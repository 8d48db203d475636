use std::time::Duration;

use signup_core::auth::AuthStrategy;
use url::Url;

use crate::error::AuthError;

/// Configuration for a single OIDC provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: Url,
}

/// Apple-specific configuration (uses signed JWT for client secret).
#[derive(Debug, Clone)]
pub struct AppleConfig {
    pub client_id: String,
    pub team_id: String,
    pub key_id: String,
    pub private_key: String, // PEM-encoded ES256 private key
    pub redirect_uri: Url,
}

/// Complete auth configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub strategy: AuthStrategy,
    pub google: Option<ProviderConfig>,
    pub apple: Option<AppleConfig>,
    /// Serve the Apple button from the synthetic callback instead of Apple.
    pub apple_mock_enabled: bool,
    pub session_ttl: Duration,
    /// Managed sessions are re-stamped once they are this old.
    pub session_update_age: Duration,
    pub flow_ttl: Duration,
    /// How long a page waits for the auth state to settle.
    pub auth_state_timeout: Duration,
    pub base_url: Url,
    pub cookie_name: String,
    pub tab_cookie_name: String,
    pub cookie_secure: bool,
    /// Where the development IdP listens.
    #[cfg(feature = "mock")]
    pub mock_idp_url: Url,
}

impl AuthConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AUTH_BASE_URL`: Base URL for callback redirects (default: `http://localhost:3000`)
    /// - `AUTH_STRATEGY`: `direct` or `managed` (default: `direct`)
    /// - `GOOGLE_CLIENT_ID`: Google OAuth client ID (optional, enables Google auth)
    /// - `GOOGLE_CLIENT_SECRET`: Google OAuth client secret (required if Google enabled)
    /// - `APPLE_CLIENT_ID`: Apple OAuth client ID (optional, enables Apple auth)
    /// - `APPLE_TEAM_ID`: Apple developer team ID (required if Apple enabled)
    /// - `APPLE_KEY_ID`: Apple key ID (required if Apple enabled)
    /// - `APPLE_PRIVATE_KEY`: Apple ES256 private key PEM (required if Apple enabled)
    /// - `APPLE_MOCK_ENABLED`: `true`/`1` to fake the Apple round trip (default: off)
    /// - `SESSION_TTL_DAYS`: Session TTL in days (default: 7)
    /// - `SESSION_UPDATE_AGE_SECS`: Managed session refresh age (default: 86400)
    /// - `AUTH_STATE_TIMEOUT_MS`: Wait for the auth state to settle (default: 1500)
    /// - `COOKIE_SECURE`: Whether to set secure flag on cookies (default: true)
    /// - `MOCK_IDP_URL`: Development IdP URL, `mock` feature only (default: `http://localhost:3001`)
    ///
    /// # Errors
    ///
    /// Returns an error if a provider is partially configured (e.g., client ID
    /// without secret) or a value does not parse.
    pub fn from_env() -> Result<Self, AuthError> {
        let base_url: Url = std::env::var("AUTH_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .parse()
            .map_err(|e| AuthError::Config(format!("AUTH_BASE_URL must be a valid URL: {e}")))?;

        let strategy = match std::env::var("AUTH_STRATEGY") {
            Ok(value) => value.parse().map_err(AuthError::Config)?,
            Err(_) => AuthStrategy::default(),
        };

        let google = match std::env::var("GOOGLE_CLIENT_ID") {
            Ok(client_id) => Some(ProviderConfig {
                client_id,
                client_secret: Some(required("GOOGLE_CLIENT_SECRET")?),
                redirect_uri: callback_url(&base_url, "/auth/google/callback")?,
            }),
            Err(_) => None,
        };

        let apple = match std::env::var("APPLE_CLIENT_ID") {
            Ok(client_id) => Some(AppleConfig {
                client_id,
                team_id: required("APPLE_TEAM_ID")?,
                key_id: required("APPLE_KEY_ID")?,
                private_key: required("APPLE_PRIVATE_KEY")?,
                redirect_uri: callback_url(&base_url, "/auth/apple/callback")?,
            }),
            Err(_) => None,
        };

        let apple_mock_enabled = flag("APPLE_MOCK_ENABLED", false);

        let session_ttl = std::env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|days| Duration::from_secs(days * 24 * 60 * 60))
            .unwrap_or(Duration::from_secs(7 * 24 * 60 * 60)); // 7 days default

        let session_update_age = std::env::var("SESSION_UPDATE_AGE_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(24 * 60 * 60));

        let auth_state_timeout = std::env::var("AUTH_STATE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(1500));

        let cookie_secure = flag("COOKIE_SECURE", true);

        #[cfg(feature = "mock")]
        let mock_idp_url: Url = std::env::var("MOCK_IDP_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string())
            .parse()
            .map_err(|e| AuthError::Config(format!("MOCK_IDP_URL must be a valid URL: {e}")))?;

        Ok(Self {
            strategy,
            google,
            apple,
            apple_mock_enabled,
            session_ttl,
            session_update_age,
            flow_ttl: Duration::from_secs(600), // 10 minutes for auth flow
            auth_state_timeout,
            base_url,
            cookie_name: "session".to_string(),
            tab_cookie_name: "signup_tab".to_string(),
            cookie_secure,
            #[cfg(feature = "mock")]
            mock_idp_url,
        })
    }

    /// Local development defaults with no providers configured.
    pub fn for_base_url(base_url: Url) -> Self {
        Self {
            strategy: AuthStrategy::default(),
            google: None,
            apple: None,
            apple_mock_enabled: false,
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            session_update_age: Duration::from_secs(24 * 60 * 60),
            flow_ttl: Duration::from_secs(600),
            auth_state_timeout: Duration::from_millis(1500),
            #[cfg(feature = "mock")]
            mock_idp_url: base_url.clone(),
            base_url,
            cookie_name: "session".to_string(),
            tab_cookie_name: "signup_tab".to_string(),
            cookie_secure: false,
        }
    }

    pub fn with_strategy(mut self, strategy: AuthStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_apple_mock(mut self, enabled: bool) -> Self {
        self.apple_mock_enabled = enabled;
        self
    }

    pub fn with_auth_state_timeout(mut self, timeout: Duration) -> Self {
        self.auth_state_timeout = timeout;
        self
    }

    /// Callback URL registered with the provider.
    pub fn callback_url(&self, provider: &str) -> Result<Url, AuthError> {
        callback_url(&self.base_url, &format!("/auth/{provider}/callback"))
    }
}

fn required(name: &str) -> Result<String, AuthError> {
    std::env::var(name).map_err(|_| AuthError::Config(format!("{name} must be set")))
}

fn flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}

fn callback_url(base_url: &Url, path: &str) -> Result<Url, AuthError> {
    base_url
        .join(path)
        .map_err(|e| AuthError::Config(format!("invalid callback URL {path}: {e}")))
}
