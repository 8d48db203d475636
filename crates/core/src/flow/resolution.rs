use super::Status;
use crate::auth::AuthError;
use crate::identity::Identity;
use crate::tab::AttemptMarker;

/// What the entry page does with the answer to "did a redirect just finish?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectResolution {
    /// No result and nothing was attempted.
    Idle,
    /// A redirect was started but came back without a result.
    Lost { provider: String },
    Success {
        provider_label: String,
        identity: Identity,
    },
    Failed {
        code: Option<String>,
        message: String,
    },
}

impl RedirectResolution {
    /// Reconcile the identity layer's redirect result with the attempt marker.
    pub fn resolve(
        result: Result<Option<Identity>, AuthError>,
        attempt: Option<&AttemptMarker>,
        last_provider: Option<&str>,
    ) -> Self {
        match result {
            Ok(Some(identity)) => Self::Success {
                provider_label: last_provider.unwrap_or("unknown").to_string(),
                identity,
            },
            Ok(None) => match attempt {
                Some(marker) => Self::Lost {
                    provider: marker.provider().to_string(),
                },
                None => Self::Idle,
            },
            Err(err) => Self::Failed {
                code: err.code().map(String::from),
                message: err.to_string(),
            },
        }
    }

    /// Status line to show, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Idle => None,
            Self::Lost { provider } => Some(Status::error(
                AuthError::RedirectLost {
                    provider: provider.clone(),
                }
                .to_string(),
            )),
            Self::Success { provider_label, .. } => {
                Some(Status::success(format!("Success ({provider_label})")))
            }
            Self::Failed { message, .. } if message.is_empty() => {
                Some(Status::error("Authentication failed"))
            }
            Self::Failed { message, .. } => Some(Status::error(message.clone())),
        }
    }

    /// Every outcome except `Idle` consumes the attempt markers.
    pub fn clears_markers(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub fn navigates(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn debug_message(&self) -> String {
        match self {
            Self::Idle => "No redirect result returned".to_string(),
            Self::Lost { provider } => format!("Redirect session lost for {provider}"),
            Self::Success { provider_label, .. } => {
                format!("{provider_label} redirect result success")
            }
            Self::Failed { code, message } => {
                let detail = code
                    .as_deref()
                    .filter(|c| !c.is_empty())
                    .or(Some(message.as_str()).filter(|m| !m.is_empty()))
                    .unwrap_or("unknown");
                format!("Redirect error: {detail}")
            }
        }
    }
}
