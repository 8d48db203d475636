mod error;
mod functions;
mod subscription;
mod traits;
mod types;

pub use error::AuthError;
pub use functions::{
    calculate_expiry, generate_session_id, generate_state, is_flow_expired, is_session_expired,
    needs_refresh,
};
pub use subscription::AuthStateSubscription;
pub use traits::{IdentityLayer, OidcProviderClient, Result, SessionRepository};
pub use types::{
    AuthFlowState, AuthState, AuthStrategy, OidcClaims, OidcProvider, Persistence,
    RedirectCallback, RedirectOutcome, Session, SessionId, SignedIn,
};
