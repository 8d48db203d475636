//! What the entry page does on every load.

use signup_core::auth::AuthState as SignInState;
use signup_core::flow::{NavigationLatch, RedirectResolution, Status, DASHBOARD_PATH};
use signup_core::identity::Identity;

use crate::extractors::Visitor;
use crate::AuthState;

/// Everything the entry page template needs.
#[derive(Debug, Clone)]
pub struct EntryView {
    pub status: Status,
    pub ready: bool,
    pub busy: bool,
    pub apple_mock: bool,
    pub debug_lines: Vec<String>,
}

impl EntryView {
    pub fn google_disabled(&self) -> bool {
        self.busy || !self.ready
    }

    /// The mock path works without an identity layer.
    pub fn apple_disabled(&self) -> bool {
        self.busy || (!self.ready && !self.apple_mock)
    }
}

#[derive(Debug)]
pub enum EntryOutcome {
    Navigate(&'static str),
    Render(EntryView),
}

/// Resolve a load of the entry page.
///
/// `apple_mock_redirect` is the `appleMockRedirect=1` query flag left by the
/// mock sign-in.
pub async fn resolve_entry(
    state: &AuthState,
    visitor: &mut Visitor,
    apple_mock_redirect: bool,
) -> EntryOutcome {
    let tab = visitor.tab.clone();
    tab.debug(format!("Page loaded at {}", state.config.base_url))
        .await;

    // Read once on every load so a stale error never outlives this page view.
    let flash = visitor.take_flash();

    if apple_mock_redirect {
        tab.store_mock_user(&Identity::apple_mock()).await;
        tab.clear_markers().await;
        tab.debug("Apple mock redirect result received").await;
        tracing::info!(tab = %tab.id(), "Apple mock sign-in completed");
        return EntryOutcome::Navigate(DASHBOARD_PATH);
    }

    let layer = match state.layer() {
        Ok(layer) => layer,
        Err(e) => {
            tab.debug(format!("Identity layer config error: {e}")).await;
            return EntryOutcome::Render(
                view(state, visitor, Status::error(e.user_message()), false).await,
            );
        }
    };
    tab.debug("Identity layer initialized").await;

    let session = visitor.session().cloned();
    let latch = NavigationLatch::new();

    let auth_branch = async {
        let Some(ref session) = session else {
            return SignInState::SignedOut;
        };
        let settled = layer
            .subscribe(session)
            .await
            .settled_within(state.config.auth_state_timeout)
            .await;
        if settled.identity().is_some() {
            latch.try_navigate(DASHBOARD_PATH);
        }
        settled
    };

    let result_branch = async {
        let result = match session {
            Some(ref session) => layer.get_redirect_result(session).await,
            None => Ok(None),
        };
        let rotated = match &result {
            Ok(Some(signed_in)) => Some((signed_in.session.clone(), signed_in.persistence)),
            _ => None,
        };
        let attempt = tab.attempt().await;
        let last_provider = tab.last_provider().await;

        let resolution = RedirectResolution::resolve(
            result.map(|signed_in| signed_in.map(|s| s.identity)),
            attempt.as_ref(),
            last_provider.as_deref(),
        );
        if resolution.navigates() {
            latch.try_navigate(DASHBOARD_PATH);
        }
        (resolution, rotated)
    };

    let (auth_state, (resolution, rotated)) = tokio::join!(auth_branch, result_branch);

    // The pre-sign-in id is retired; the browser carries the new one from here.
    if let Some((id, persistence)) = rotated {
        tracing::debug!(tab = %tab.id(), "Session id rotated after sign-in");
        visitor.set_session(id, persistence);
    }

    match auth_state {
        SignInState::SignedIn(ref identity) => {
            let who = identity.email.as_deref().unwrap_or(identity.uid.as_str());
            tab.debug(format!("Auth state user found: {who}")).await;
        }
        SignInState::SignedOut => tab.debug("Auth state: no active user").await,
        SignInState::Pending => tab.debug("Auth state: still pending").await,
    }

    apply_resolution(visitor, &resolution).await;

    if let Some(target) = latch.target() {
        return EntryOutcome::Navigate(target);
    }

    let status = resolution.status().unwrap_or_else(|| match flash {
        Some(flash) if flash.is_error() => Status::error(flash.message),
        _ => Status::idle(),
    });

    EntryOutcome::Render(view(state, visitor, status, true).await)
}

/// Write the resolution's side effects to tab storage.
async fn apply_resolution(visitor: &Visitor, resolution: &RedirectResolution) {
    let tab = &visitor.tab;

    match resolution {
        RedirectResolution::Idle => {
            tab.debug(resolution.debug_message()).await;
        }
        RedirectResolution::Lost { provider } => {
            tracing::warn!(tab = %tab.id(), %provider, "Redirect returned without a result");
            tab.debug(RedirectResolution::Idle.debug_message()).await;
            tab.debug(resolution.debug_message()).await;
        }
        RedirectResolution::Success { identity, .. } => {
            tracing::info!(uid = %identity.uid, "Redirect result received");
            tab.reset_debug().await;
            tab.debug(resolution.debug_message()).await;
        }
        RedirectResolution::Failed { message, .. } => {
            tracing::warn!(tab = %tab.id(), error = %message, "Redirect result was an error");
            tab.debug(resolution.debug_message()).await;
        }
    }

    if resolution.clears_markers() {
        tab.clear_markers().await;
    }
}

async fn view(state: &AuthState, visitor: &Visitor, status: Status, ready: bool) -> EntryView {
    EntryView {
        status,
        ready,
        busy: state.busy.is_busy(visitor.tab_id()),
        apple_mock: state.config.apple_mock_enabled,
        debug_lines: visitor
            .tab
            .debug_trail()
            .await
            .lines()
            .map(String::from)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ready: bool, busy: bool, apple_mock: bool) -> EntryView {
        EntryView {
            status: Status::idle(),
            ready,
            busy,
            apple_mock,
            debug_lines: Vec::new(),
        }
    }

    #[test]
    fn test_buttons_disabled_while_busy() {
        let view = entry(true, true, true);
        assert!(view.google_disabled());
        assert!(view.apple_disabled());
    }

    #[test]
    fn test_mock_keeps_apple_enabled_without_layer() {
        let view = entry(false, false, true);
        assert!(view.google_disabled());
        assert!(!view.apple_disabled());
    }

    #[test]
    fn test_no_layer_no_mock_disables_both() {
        let view = entry(false, false, false);
        assert!(view.google_disabled());
        assert!(view.apple_disabled());
    }

    #[test]
    fn test_ready_enables_both() {
        let view = entry(true, false, false);
        assert!(!view.google_disabled());
        assert!(!view.apple_disabled());
    }
}
