//! Mock torrent client for testing.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::{ClientError, TorrentClient};

/// Mock implementation of the [`TorrentClient`] trait.
///
/// Provides controllable behavior for testing:
/// - seed torrents into the client state
/// - record removals for assertions
/// - simulate failures
pub struct MockTorrentClient {
    host: String,
    torrents: RwLock<HashSet<String>>,
    removed: RwLock<Vec<String>>,
    fail_next_remove: RwLock<bool>,
}

impl MockTorrentClient {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            torrents: RwLock::new(HashSet::new()),
            removed: RwLock::new(Vec::new()),
            fail_next_remove: RwLock::new(false),
        }
    }

    /// Pretend the client already holds this torrent.
    pub async fn seed(&self, info_hash: &str) {
        self.torrents.write().await.insert(info_hash.to_lowercase());
    }

    /// Hashes removed so far, in order.
    pub async fn removed(&self) -> Vec<String> {
        self.removed.read().await.clone()
    }

    /// Make the next `remove_torrent` call fail.
    pub async fn fail_next_remove(&self) {
        *self.fail_next_remove.write().await = true;
    }

    pub async fn contains(&self, info_hash: &str) -> bool {
        self.torrents.read().await.contains(&info_hash.to_lowercase())
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn remove_torrent(
        &self,
        info_hash: &str,
        _delete_data: bool,
    ) -> Result<(), ClientError> {
        if std::mem::take(&mut *self.fail_next_remove.write().await) {
            return Err(ClientError::ApiError("simulated failure".to_string()));
        }
        let hash = info_hash.to_lowercase();
        self.torrents.write().await.remove(&hash);
        self.removed.write().await.push(hash);
        Ok(())
    }

    async fn is_torrent_in_client(&self, info_hash: &str) -> Result<bool, ClientError> {
        Ok(self.contains(info_hash).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_remove_verify() {
        let client = MockTorrentClient::new("qbit.local");
        let hash = "a".repeat(40);
        client.seed(&hash).await;
        assert!(client.is_torrent_in_client(&hash).await.unwrap());

        client.remove_torrent(&hash, false).await.unwrap();
        assert!(!client.is_torrent_in_client(&hash).await.unwrap());
        assert_eq!(client.removed().await, vec![hash]);
    }

    #[tokio::test]
    async fn test_fail_next_remove_is_one_shot() {
        let client = MockTorrentClient::new("qbit.local");
        let hash = "a".repeat(40);
        client.seed(&hash).await;
        client.fail_next_remove().await;

        assert!(client.remove_torrent(&hash, false).await.is_err());
        assert!(client.is_torrent_in_client(&hash).await.unwrap());
        assert!(client.remove_torrent(&hash, false).await.is_ok());
    }
}
