use crate::auth::OidcProvider;

/// Which provider a redirect was started for.
///
/// Stored as the provider label so a lost session can be reported by name even
/// if the stored value is not a provider this build knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptMarker {
    provider: String,
}

impl AttemptMarker {
    pub fn new(provider: OidcProvider) -> Self {
        Self {
            provider: provider.label().to_string(),
        }
    }

    /// Rebuild a marker from a stored value. Blank values mean no marker.
    pub fn from_stored(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(Self {
            provider: value.to_string(),
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn to_stored(&self) -> String {
        self.provider.clone()
    }
}
