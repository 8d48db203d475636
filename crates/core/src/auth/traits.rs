use async_trait::async_trait;
use url::Url;

use super::{
    AuthError, AuthFlowState, AuthStateSubscription, AuthStrategy, OidcClaims, OidcProvider,
    Persistence, RedirectCallback, RedirectOutcome, Session, SessionId, SignedIn,
};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Abstraction over OIDC identity providers.
#[async_trait]
pub trait OidcProviderClient: Send + Sync {
    /// Generate authorization URL for user redirect.
    async fn authorization_url(&self, state: &str, pkce_challenge: &str) -> Result<Url>;

    /// Exchange authorization code for claims.
    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<OidcClaims>;

    /// Which provider this client represents.
    fn provider(&self) -> OidcProvider;
}

/// Session storage abstraction.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a session, replacing any existing one with the same ID.
    async fn create_session(&self, session: &Session) -> Result<()>;

    /// Retrieve session by ID.
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Delete a specific session.
    async fn delete_session(&self, id: &SessionId) -> Result<()>;

    /// Store PKCE/state for auth flow (short TTL).
    async fn store_auth_flow(&self, state: &str, flow: &AuthFlowState) -> Result<()>;

    /// Retrieve and delete auth flow state.
    async fn take_auth_flow(&self, state: &str) -> Result<Option<AuthFlowState>>;

    /// Park the outcome of a provider callback for the browser session.
    async fn store_outcome(&self, session: &SessionId, outcome: &RedirectOutcome) -> Result<()>;

    /// Retrieve and delete the parked outcome.
    async fn take_outcome(&self, session: &SessionId) -> Result<Option<RedirectOutcome>>;
}

/// The identity/session API the pages talk to.
///
/// Implementations are interchangeable strategies for the same contract and
/// are picked once at startup.
#[async_trait]
pub trait IdentityLayer: Send + Sync {
    fn strategy(&self) -> AuthStrategy;

    /// Request a persistence mode for the browser session. Returns the mode
    /// the layer will actually use.
    async fn set_persistence(
        &self,
        session: &SessionId,
        persistence: Persistence,
    ) -> Result<Persistence>;

    /// Begin a redirect sign-in and return the provider URL to navigate to.
    ///
    /// `persistence` is the mode returned by [`set_persistence`](Self::set_persistence);
    /// it travels with the flow and applies to the session the callback creates.
    async fn start_redirect(
        &self,
        session: &SessionId,
        provider: OidcProvider,
        persistence: Persistence,
    ) -> Result<Url>;

    /// Handle the provider callback. Returns the pre-sign-in browser session
    /// the outcome was parked for.
    ///
    /// A successful sign-in is stored under a newly minted session id, which
    /// the outcome carries back to the browser.
    async fn complete_redirect(&self, callback: RedirectCallback) -> Result<SessionId>;

    /// One-shot result of the last redirect for this session.
    async fn get_redirect_result(&self, session: &SessionId) -> Result<Option<SignedIn>>;

    /// Subscribe to signed-in state changes for the session.
    async fn subscribe(&self, session: &SessionId) -> AuthStateSubscription;

    async fn sign_out(&self, session: &SessionId) -> Result<()>;
}
