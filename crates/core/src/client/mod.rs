//! Torrent client driver abstraction.
//!
//! The engine only needs a narrow slice of a client's surface: remove a
//! torrent without touching its data, and verify presence. Concrete drivers
//! (qBittorrent, Deluge, ...) live outside this crate; tests use
//! [`crate::testing::MockTorrentClient`].

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Driver for one torrent client instance.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Stable identifier matching `client_searchee.client_host`.
    fn host(&self) -> &str;

    /// Remove a torrent. `delete_data` is always false for evictions: the
    /// payload stays on disk for the surviving copy.
    async fn remove_torrent(&self, info_hash: &str, delete_data: bool)
        -> Result<(), ClientError>;

    /// Whether the client currently holds the torrent.
    async fn is_torrent_in_client(&self, info_hash: &str) -> Result<bool, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ClientError::TorrentNotFound("abc".to_string()).to_string(),
            "Torrent not found: abc"
        );
        assert_eq!(ClientError::Timeout.to_string(), "Request timeout");
    }
}
