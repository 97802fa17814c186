//! In-memory correlation between indexer listings and snatched torrents.
//!
//! Both a candidate's guid and its download link map to the info-hash of
//! the torrent it produced, so reassessments skip the snatch. Rebuilt from
//! the decision table at startup; all access is serialized by one mutex.

use std::collections::HashMap;

use tokio::sync::Mutex;

/// Process-scoped `(guid, link) -> info_hash` map.
#[derive(Default)]
pub struct GuidInfoHashMap {
    inner: Mutex<HashMap<String, String>>,
}

impl GuidInfoHashMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snatched candidate under both its guid and link.
    pub async fn insert(&self, guid: &str, link: Option<&str>, info_hash: &str) {
        let mut map = self.inner.lock().await;
        map.insert(guid.to_string(), info_hash.to_lowercase());
        if let Some(link) = link {
            map.insert(link.to_string(), info_hash.to_lowercase());
        }
    }

    /// Look up by guid first, then by link.
    pub async fn get(&self, guid: &str, link: Option<&str>) -> Option<String> {
        let map = self.inner.lock().await;
        if let Some(hash) = map.get(guid) {
            return Some(hash.clone());
        }
        link.and_then(|l| map.get(l).cloned())
    }

    /// Replace the whole map from persisted `(guid, info_hash)` pairs.
    pub async fn rebuild(&self, pairs: Vec<(String, String)>) {
        let mut map = self.inner.lock().await;
        map.clear();
        for (guid, hash) in pairs {
            map.insert(guid, hash.to_lowercase());
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get_by_guid_or_link() {
        let map = GuidInfoHashMap::new();
        map.insert("guid-1", Some("https://x/dl/1"), &"A".repeat(40))
            .await;

        let hash = "a".repeat(40);
        assert_eq!(map.get("guid-1", None).await.as_deref(), Some(hash.as_str()));
        assert_eq!(
            map.get("other", Some("https://x/dl/1")).await.as_deref(),
            Some(hash.as_str())
        );
        assert!(map.get("other", Some("https://x/dl/2")).await.is_none());
    }

    #[tokio::test]
    async fn test_rebuild_replaces_content() {
        let map = GuidInfoHashMap::new();
        map.insert("old", None, &"a".repeat(40)).await;
        map.rebuild(vec![("new".to_string(), "b".repeat(40))]).await;

        assert!(map.get("old", None).await.is_none());
        assert_eq!(map.get("new", None).await, Some("b".repeat(40)));
        assert_eq!(map.len().await, 1);
    }
}
