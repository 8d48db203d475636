use std::time::Duration;

use tokio::sync::watch;

use super::AuthState;

/// Handle returned by [`IdentityLayer::subscribe`](super::IdentityLayer::subscribe).
///
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe)) stops
/// receiving notifications.
#[derive(Debug)]
pub struct AuthStateSubscription {
    receiver: watch::Receiver<AuthState>,
}

impl AuthStateSubscription {
    pub fn new(receiver: watch::Receiver<AuthState>) -> Self {
        Self { receiver }
    }

    /// Latest value without waiting.
    pub fn current(&self) -> AuthState {
        self.receiver.borrow().clone()
    }

    /// Wait for the first value that is not [`AuthState::Pending`].
    ///
    /// If the layer drops its sender first, the last known value is returned.
    pub async fn settled(&mut self) -> AuthState {
        let settled = self
            .receiver
            .wait_for(|state| !state.is_pending())
            .await
            .map(|state| state.clone());

        match settled {
            Ok(state) => state,
            Err(_) => self.receiver.borrow().clone(),
        }
    }

    /// Like [`settled`](Self::settled) but gives up after `timeout`, returning
    /// [`AuthState::Pending`].
    pub async fn settled_within(&mut self, timeout: Duration) -> AuthState {
        tokio::time::timeout(timeout, self.settled())
            .await
            .unwrap_or(AuthState::Pending)
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    #[tokio::test]
    async fn settled_skips_pending() {
        let (tx, rx) = watch::channel(AuthState::Pending);
        let mut sub = AuthStateSubscription::new(rx);

        tokio::spawn(async move {
            tx.send(AuthState::SignedIn(Identity::apple_mock())).unwrap();
        });

        assert_eq!(
            sub.settled().await,
            AuthState::SignedIn(Identity::apple_mock())
        );
    }

    #[tokio::test]
    async fn settled_within_times_out_as_pending() {
        let (_tx, rx) = watch::channel(AuthState::Pending);
        let mut sub = AuthStateSubscription::new(rx);

        let state = sub.settled_within(Duration::from_millis(10)).await;
        assert_eq!(state, AuthState::Pending);
    }

    #[tokio::test]
    async fn settled_returns_last_value_when_sender_dropped() {
        let (tx, rx) = watch::channel(AuthState::Pending);
        let mut sub = AuthStateSubscription::new(rx);
        drop(tx);

        assert_eq!(sub.settled().await, AuthState::Pending);
    }

    #[tokio::test]
    async fn current_reads_without_waiting() {
        let (_tx, rx) = watch::channel(AuthState::SignedOut);
        let sub = AuthStateSubscription::new(rx);
        assert_eq!(sub.current(), AuthState::SignedOut);
        sub.unsubscribe();
    }
}
