//! Gatekeeping for the dashboard, and sign-out.

use signup_core::auth::AuthState as SignInState;
use signup_core::identity::ProfileView;

use crate::extractors::Visitor;
use crate::flash::FlashMessage;
use crate::AuthState;

#[derive(Debug)]
pub enum DashboardOutcome {
    Profile(ProfileView),
    /// The session lookup has not settled yet.
    Loading,
    /// Back to the entry page, optionally explaining why.
    Redirect(Option<FlashMessage>),
}

/// Decide what the dashboard shows for this browser.
///
/// A mock record in tab storage wins over any identity-layer session.
pub async fn guard_dashboard(state: &AuthState, visitor: &Visitor) -> DashboardOutcome {
    if let Some(identity) = visitor.tab.mock_user().await {
        return DashboardOutcome::Profile(ProfileView::new(identity.provider.label(), &identity));
    }

    let layer = match state.layer() {
        Ok(layer) => layer,
        Err(e) => return DashboardOutcome::Redirect(Some(FlashMessage::error(e.user_message()))),
    };

    let Some(session) = visitor.session() else {
        return DashboardOutcome::Redirect(None);
    };

    let settled = layer
        .subscribe(session)
        .await
        .settled_within(state.config.auth_state_timeout)
        .await;

    match settled {
        SignInState::SignedIn(identity) => {
            let provider = format!(
                "{} ({})",
                identity.provider.label(),
                layer.strategy().label()
            );
            DashboardOutcome::Profile(ProfileView::new(provider, &identity))
        }
        SignInState::SignedOut => DashboardOutcome::Redirect(None),
        SignInState::Pending => {
            tracing::debug!(session = %session, "Session lookup still pending");
            DashboardOutcome::Loading
        }
    }
}

/// Sign the browser out of both tab storage and the identity layer.
///
/// Returns `false` without touching anything if the tab is already busy.
/// Identity-layer failures are logged and otherwise ignored.
pub async fn sign_out(state: &AuthState, visitor: &mut Visitor) -> bool {
    let Some(_busy) = state.busy.acquire(visitor.tab_id()) else {
        tracing::debug!(tab = %visitor.tab_id(), "Sign-out ignored, tab busy");
        return false;
    };

    visitor.tab.clear().await;

    if let (Ok(layer), Some(session)) = (state.layer(), visitor.session()) {
        if let Err(e) = layer.sign_out(session).await {
            tracing::debug!(error = %e, "No identity-layer session to sign out");
        }
    }

    visitor.clear_session();
    true
}
