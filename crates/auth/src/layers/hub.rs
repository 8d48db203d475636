//! Fan-out of auth-state changes to page subscriptions.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use signup_core::auth::{AuthState, AuthStateSubscription, SessionId};
use tokio::sync::watch;

type Channels = HashMap<SessionId, watch::Sender<AuthState>>;

/// One `watch` channel per browser session with live subscribers.
///
/// Channels whose receivers have all been dropped are pruned on the next
/// subscribe.
#[derive(Clone, Default)]
pub struct AuthStateHub {
    channels: Arc<Mutex<Channels>>,
}

impl AuthStateHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn channels(&self) -> MutexGuard<'_, Channels> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to a session and refresh its state in the background.
    ///
    /// A session nobody is watching yet starts out `Pending` until `lookup`
    /// resolves.
    pub fn subscribe<F>(&self, session: &SessionId, lookup: F) -> AuthStateSubscription
    where
        F: Future<Output = AuthState> + Send + 'static,
    {
        let receiver = {
            let mut channels = self.channels();
            channels.retain(|_, sender| !sender.is_closed());
            channels
                .entry(session.clone())
                .or_insert_with(|| watch::channel(AuthState::Pending).0)
                .subscribe()
        };

        let hub = self.clone();
        let session = session.clone();
        tokio::spawn(async move {
            let state = lookup.await;
            hub.publish(&session, state);
        });

        AuthStateSubscription::new(receiver)
    }

    /// Notify subscribers of `session`. Unchanged values do not wake anyone.
    pub fn publish(&self, session: &SessionId, state: AuthState) {
        if let Some(sender) = self.channels().get(session) {
            sender.send_if_modified(|current| {
                if *current == state {
                    false
                } else {
                    *current = state;
                    true
                }
            });
        }
    }

    /// Number of sessions with a live channel.
    pub fn len(&self) -> usize {
        self.channels().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
