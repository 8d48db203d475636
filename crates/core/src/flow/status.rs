use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Idle,
    Loading,
    Success,
    Error,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// The status line on the entry page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    pub fn idle() -> Self {
        Self {
            kind: StatusKind::Idle,
            text: "Idle".to_string(),
        }
    }

    pub fn loading(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Loading,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.kind == StatusKind::Idle
    }

    pub fn css_class(&self) -> String {
        format!("status status-{}", self.kind.as_str())
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_class_follows_kind() {
        assert_eq!(Status::idle().css_class(), "status status-idle");
        assert_eq!(Status::error("x").css_class(), "status status-error");
    }

    #[test]
    fn default_is_idle() {
        let status = Status::default();
        assert!(status.is_idle());
        assert_eq!(status.text, "Idle");
    }
}
