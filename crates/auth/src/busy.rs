//! Per-tab guard against double submission.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use signup_core::tab::TabId;

/// Tabs with a sign-in or sign-out request in flight.
#[derive(Clone, Default)]
pub struct BusyFlags {
    busy: Arc<Mutex<HashSet<TabId>>>,
}

impl BusyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    fn busy(&self) -> MutexGuard<'_, HashSet<TabId>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark the tab busy. Returns `None` if it already is.
    pub fn acquire(&self, tab: &TabId) -> Option<BusyGuard> {
        if !self.busy().insert(tab.clone()) {
            return None;
        }
        Some(BusyGuard {
            flags: self.clone(),
            tab: tab.clone(),
        })
    }

    pub fn is_busy(&self, tab: &TabId) -> bool {
        self.busy().contains(tab)
    }
}

/// Clears the busy flag when dropped, whatever the request outcome.
pub struct BusyGuard {
    flags: BusyFlags,
    tab: TabId,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flags.busy().remove(&self.tab);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let flags = BusyFlags::new();
        let tab = TabId::new();

        let guard = flags.acquire(&tab);
        assert!(guard.is_some());
        assert!(flags.is_busy(&tab));
        assert!(flags.acquire(&tab).is_none());

        drop(guard);
        assert!(!flags.is_busy(&tab));
        assert!(flags.acquire(&tab).is_some());
    }

    #[test]
    fn test_tabs_are_independent() {
        let flags = BusyFlags::new();
        let _first = flags.acquire(&TabId::new()).unwrap();
        assert!(flags.acquire(&TabId::new()).is_some());
    }
}
