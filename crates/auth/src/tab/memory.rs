//! In-memory tab storage with LRU eviction.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use signup_core::auth::Result;
use signup_core::tab::{TabId, TabStorage};

/// Tab storage kept in process memory.
///
/// Each tab owns a small string map. Once `max_tabs` tabs are tracked the
/// least recently touched one is evicted, which is indistinguishable from the
/// browser having closed it.
#[derive(Debug, Clone)]
pub struct MemoryTabStorage {
    tabs: Arc<RwLock<LruCache<TabId, HashMap<String, String>>>>,
}

impl MemoryTabStorage {
    /// Creates a store tracking at most `max_tabs` tabs (minimum 1).
    pub fn new(max_tabs: usize) -> Self {
        let capacity = NonZeroUsize::new(max_tabs).unwrap_or(NonZeroUsize::MIN);
        Self {
            tabs: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }
}

#[async_trait]
impl TabStorage for MemoryTabStorage {
    async fn get(&self, tab: &TabId, key: &str) -> Result<Option<String>> {
        // LruCache::get promotes the entry, so it needs the write lock.
        let mut tabs = self.tabs.write().await;
        Ok(tabs.get(tab).and_then(|values| values.get(key).cloned()))
    }

    async fn set(&self, tab: &TabId, key: &str, value: String) -> Result<()> {
        let mut tabs = self.tabs.write().await;
        tabs.get_or_insert_mut(tab.clone(), HashMap::new)
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, tab: &TabId, key: &str) -> Result<()> {
        let mut tabs = self.tabs.write().await;
        if let Some(values) = tabs.get_mut(tab) {
            values.remove(key);
        }
        Ok(())
    }

    async fn clear(&self, tab: &TabId) -> Result<()> {
        let mut tabs = self.tabs.write().await;
        tabs.pop(tab);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let storage = MemoryTabStorage::new(10);
        let tab = TabId::new();

        storage.set(&tab, "lastProvider", "Google".to_string()).await.unwrap();
        assert_eq!(
            storage.get(&tab, "lastProvider").await.unwrap().as_deref(),
            Some("Google")
        );

        storage.remove(&tab, "lastProvider").await.unwrap();
        assert_eq!(storage.get(&tab, "lastProvider").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tabs_are_isolated() {
        let storage = MemoryTabStorage::new(10);
        let first = TabId::new();
        let second = TabId::new();

        storage.set(&first, "key", "one".to_string()).await.unwrap();

        assert_eq!(storage.get(&second, "key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_drops_every_key() {
        let storage = MemoryTabStorage::new(10);
        let tab = TabId::new();

        storage.set(&tab, "a", "1".to_string()).await.unwrap();
        storage.set(&tab, "b", "2".to_string()).await.unwrap();
        storage.clear(&tab).await.unwrap();

        assert_eq!(storage.get(&tab, "a").await.unwrap(), None);
        assert_eq!(storage.get(&tab, "b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let storage = MemoryTabStorage::new(2);
        let (a, b, c) = (TabId::new(), TabId::new(), TabId::new());

        storage.set(&a, "k", "a".to_string()).await.unwrap();
        storage.set(&b, "k", "b".to_string()).await.unwrap();
        // Touch `a` so `b` becomes the eviction candidate.
        storage.get(&a, "k").await.unwrap();
        storage.set(&c, "k", "c".to_string()).await.unwrap();

        assert!(storage.get(&a, "k").await.unwrap().is_some());
        assert!(storage.get(&b, "k").await.unwrap().is_none());
        assert!(storage.get(&c, "k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let storage = MemoryTabStorage::new(1);
        assert!(storage.remove(&TabId::new(), "missing").await.is_ok());
    }
}
