use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Cryptographically random session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported OIDC providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OidcProvider {
    Google,
    Apple,
}

impl OidcProvider {
    /// Human-facing name, also the value stored in the attempt marker.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Apple => "Apple",
        }
    }
}

impl std::fmt::Display for OidcProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::Apple => write!(f, "apple"),
        }
    }
}

impl FromStr for OidcProvider {
    type Err = String;

    /// Accepts both the lowercase route segment and the label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" | "Google" => Ok(Self::Google),
            "apple" | "Apple" => Ok(Self::Apple),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// How long the identity layer keeps a signed-in browser recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    /// Survives browser restarts (cookie with `Max-Age`).
    Local,
    /// Ends with the browser session (cookie without `Max-Age`).
    Session,
}

impl std::fmt::Display for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Session => write!(f, "session"),
        }
    }
}

impl FromStr for Persistence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "session" => Ok(Self::Session),
            other => Err(format!("unknown persistence: {other}")),
        }
    }
}

/// Which identity layer implementation backs the sign-up flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStrategy {
    /// The browser keeps its own signed-in state, the server only brokers the redirect.
    #[default]
    Direct,
    /// The server owns an expiring session record and revokes it on sign-out.
    Managed,
}

impl AuthStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "direct redirect",
            Self::Managed => "managed session",
        }
    }
}

impl std::fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Managed => write!(f, "managed"),
        }
    }
}

impl FromStr for AuthStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "managed" => Ok(Self::Managed),
            other => Err(format!("unknown auth strategy: {other}")),
        }
    }
}

/// Authenticated browser session held by the identity layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub identity: Identity,
    pub persistence: Persistence,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Provider-agnostic claims extracted from OIDC ID token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcClaims {
    /// Provider's unique user identifier.
    pub subject: String,
    /// User's email address.
    pub email: Option<String>,
    /// User's display name.
    pub name: Option<String>,
    /// Which provider issued these claims.
    pub provider: OidcProvider,
}

/// PKCE and state data stored during auth flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFlowState {
    pub pkce_verifier: String,
    pub provider: OidcProvider,
    /// Pre-sign-in browser session the outcome is delivered to.
    pub session_id: SessionId,
    /// Mode the layer settled on when the redirect started.
    pub persistence: Persistence,
    pub created_at: DateTime<Utc>,
}

/// A redirect sign-in that succeeded.
///
/// `session` is the id the signed-in session was stored under. It is always
/// freshly minted, never the id the browser carried through the redirect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedIn {
    pub session: SessionId,
    pub persistence: Persistence,
    pub identity: Identity,
}

/// What a provider callback produced, parked until the entry page asks for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedirectOutcome {
    Success(SignedIn),
    Failure { code: String, message: String },
}

impl RedirectOutcome {
    /// Park an error, keeping the provider's own code when it sent one.
    pub fn failure(err: &super::AuthError) -> Self {
        Self::Failure {
            code: err.code().unwrap_or(err.kind()).to_string(),
            message: err.to_string(),
        }
    }

    pub fn into_result(self) -> Result<SignedIn, super::AuthError> {
        match self {
            Self::Success(signed_in) => Ok(signed_in),
            Self::Failure { code, message } => Err(super::AuthError::Rejected { code, message }),
        }
    }
}

/// Value delivered to auth-state subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// The layer has not finished looking the session up yet.
    Pending,
    SignedOut,
    SignedIn(Identity),
}

impl AuthState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Parameters a provider sends back to the callback route.
#[derive(Debug, Clone, Default)]
pub struct RedirectCallback {
    pub state: String,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    /// Apple only sends the user's name on the very first authorization.
    pub user_name: Option<String>,
}
