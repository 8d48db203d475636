use std::sync::OnceLock;

/// First-completed-wins navigation.
///
/// Several concurrent branches may decide to leave the page; only the first
/// call to [`try_navigate`](Self::try_navigate) takes effect and every later
/// call is a no-op.
#[derive(Debug, Default)]
pub struct NavigationLatch {
    target: OnceLock<&'static str>,
}

impl NavigationLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this call claimed the navigation.
    pub fn try_navigate(&self, to: &'static str) -> bool {
        self.target.set(to).is_ok()
    }

    pub fn target(&self) -> Option<&'static str> {
        self.target.get().copied()
    }

    pub fn has_navigated(&self) -> bool {
        self.target.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_navigation_wins() {
        let latch = NavigationLatch::new();
        assert!(!latch.has_navigated());
        assert!(latch.try_navigate("/dashboard"));
        assert!(!latch.try_navigate("/"));
        assert_eq!(latch.target(), Some("/dashboard"));
    }

    #[tokio::test]
    async fn concurrent_branches_navigate_once() {
        let latch = Arc::new(NavigationLatch::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let latch = latch.clone();
            handles.push(tokio::spawn(async move { latch.try_navigate("/dashboard") }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
