use async_trait::async_trait;

use super::TabId;
use crate::auth::Result;

/// String-keyed storage scoped to one browser tab.
///
/// Values are opaque strings; callers store JSON where they need structure.
#[async_trait]
pub trait TabStorage: Send + Sync {
    async fn get(&self, tab: &TabId, key: &str) -> Result<Option<String>>;

    async fn set(&self, tab: &TabId, key: &str, value: String) -> Result<()>;

    async fn remove(&self, tab: &TabId, key: &str) -> Result<()>;

    /// Drop every value stored for the tab.
    async fn clear(&self, tab: &TabId) -> Result<()>;
}
