//! Shared application state.

use signup_auth::AuthState;

/// State handed to every handler.
///
/// Auth handlers extract [`AuthState`] from it through `AsRef`.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
}

impl AppState {
    pub fn new(auth: AuthState) -> Self {
        Self { auth }
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}
