//! The identity record kept after a successful sign-in.

use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, OidcClaims, OidcProvider};

pub const APPLE_MOCK_UID: &str = "apple-mock-uid";
pub const APPLE_MOCK_EMAIL: &str = "mock-apple-user@example.com";
pub const APPLE_MOCK_NAME: &str = "Mock Apple User";

/// Placeholder rendered for profile fields the provider did not share.
pub const NOT_AVAILABLE: &str = "N/A";

/// Where an identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProviderKind {
    Google,
    Apple,
    AppleMock,
}

impl IdentityProviderKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Apple => "Apple",
            Self::AppleMock => "Apple (mock)",
        }
    }
}

impl From<OidcProvider> for IdentityProviderKind {
    fn from(provider: OidcProvider) -> Self {
        match provider {
            OidcProvider::Google => Self::Google,
            OidcProvider::Apple => Self::Apple,
        }
    }
}

/// Minimal profile data retained after sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub provider: IdentityProviderKind,
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    /// The fixed identity produced by the Apple mock round trip.
    pub fn apple_mock() -> Self {
        Self {
            provider: IdentityProviderKind::AppleMock,
            uid: APPLE_MOCK_UID.to_string(),
            email: Some(APPLE_MOCK_EMAIL.to_string()),
            display_name: Some(APPLE_MOCK_NAME.to_string()),
        }
    }

    /// Build an identity from verified ID token claims.
    ///
    /// # Errors
    ///
    /// Returns `MissingClaim("sub")` when the provider sent an empty subject.
    pub fn from_claims(claims: OidcClaims) -> Result<Self, AuthError> {
        if claims.subject.trim().is_empty() {
            return Err(AuthError::MissingClaim("sub".to_string()));
        }

        Ok(Self {
            provider: claims.provider.into(),
            uid: claims.subject,
            email: claims.email,
            display_name: claims.name,
        })
    }

    pub fn is_mock(&self) -> bool {
        self.provider == IdentityProviderKind::AppleMock
    }
}

/// Profile fields as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub provider: String,
    pub display_name: String,
    pub email: String,
    pub uid: String,
}

impl ProfileView {
    pub fn new(provider: impl Into<String>, identity: &Identity) -> Self {
        Self {
            provider: provider.into(),
            display_name: or_not_available(identity.display_name.as_deref()),
            email: or_not_available(identity.email.as_deref()),
            uid: or_not_available(Some(identity.uid.as_str())),
        }
    }
}

fn or_not_available(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apple_mock_is_deterministic() {
        let identity = Identity::apple_mock();
        assert_eq!(identity.provider, IdentityProviderKind::AppleMock);
        assert_eq!(identity.uid, "apple-mock-uid");
        assert_eq!(identity.email.as_deref(), Some("mock-apple-user@example.com"));
        assert_eq!(identity.display_name.as_deref(), Some("Mock Apple User"));
        assert_eq!(identity, Identity::apple_mock());
        assert!(identity.is_mock());
    }

    #[test]
    fn from_claims_maps_fields() {
        let identity = Identity::from_claims(OidcClaims {
            subject: "10769150350006150715113082367".to_string(),
            email: Some("jane@example.com".to_string()),
            name: Some("Jane Doe".to_string()),
            provider: OidcProvider::Google,
        })
        .unwrap();

        assert_eq!(identity.provider, IdentityProviderKind::Google);
        assert_eq!(identity.uid, "10769150350006150715113082367");
        assert_eq!(identity.email.as_deref(), Some("jane@example.com"));
        assert!(!identity.is_mock());
    }

    #[test]
    fn from_claims_rejects_empty_subject() {
        let result = Identity::from_claims(OidcClaims {
            subject: "  ".to_string(),
            email: None,
            name: None,
            provider: OidcProvider::Apple,
        });

        assert!(matches!(result, Err(AuthError::MissingClaim(claim)) if claim == "sub"));
    }

    #[test]
    fn profile_view_defaults_missing_fields() {
        let identity = Identity {
            provider: IdentityProviderKind::Apple,
            uid: "001234.abcd".to_string(),
            email: None,
            display_name: Some(String::new()),
        };

        let view = ProfileView::new("Apple (direct redirect)", &identity);
        assert_eq!(view.display_name, "N/A");
        assert_eq!(view.email, "N/A");
        assert_eq!(view.uid, "001234.abcd");
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(Identity::apple_mock()).unwrap();
        assert_eq!(json["provider"], "apple_mock");
        assert_eq!(json["displayName"], "Mock Apple User");
    }
}
