use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid OIDC state parameter")]
    InvalidState,

    #[error("auth flow expired before the provider returned")]
    FlowExpired,

    #[error("failed to exchange authorization code: {0}")]
    CodeExchange(String),

    #[error("invalid ID token: {0}")]
    InvalidToken(String),

    #[error("missing required claim: {0}")]
    MissingClaim(String),

    #[error("session not found")]
    SessionNotFound,

    #[error("session expired")]
    SessionExpired,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("provider error: {0}")]
    Provider(String),

    /// The provider refused the sign-in. `message` is shown to the user as-is.
    #[error("{message}")]
    Rejected { code: String, message: String },

    #[error("Redirect session lost after {provider} sign-in")]
    RedirectLost { provider: String },
}

impl AuthError {
    /// Short machine-readable code, when the provider supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            AuthError::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Stable snake_case name of the variant, used where no provider code exists.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidState => "invalid_state",
            AuthError::FlowExpired => "flow_expired",
            AuthError::CodeExchange(_) => "code_exchange_failed",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::MissingClaim(_) => "missing_claim",
            AuthError::SessionNotFound => "session_not_found",
            AuthError::SessionExpired => "session_expired",
            AuthError::Storage(_) => "storage",
            AuthError::Provider(_) => "provider",
            AuthError::Rejected { .. } => "rejected",
            AuthError::RedirectLost { .. } => "redirect_lost",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_message_verbatim() {
        let err = AuthError::Rejected {
            code: "access_denied".to_string(),
            message: "The user denied access".to_string(),
        };
        assert_eq!(err.to_string(), "The user denied access");
        assert_eq!(err.code(), Some("access_denied"));
    }

    #[test]
    fn redirect_lost_names_provider() {
        let err = AuthError::RedirectLost {
            provider: "Apple".to_string(),
        };
        assert_eq!(err.to_string(), "Redirect session lost after Apple sign-in");
        assert_eq!(err.code(), None);
    }
}
