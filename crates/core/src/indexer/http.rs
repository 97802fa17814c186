//! HTTP snatcher implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::model::{metafile_from_bytes, Candidate};

use super::{SnatchError, SnatchedTorrent, Snatcher};

/// Production snatcher: fetches `.torrent` files over HTTP.
pub struct HttpSnatcher {
    client: Client,
}

impl HttpSnatcher {
    pub fn new(timeout_secs: u64) -> Result<Self, SnatchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SnatchError::Failed(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Snatcher for HttpSnatcher {
    async fn snatch(&self, candidate: &Candidate) -> Result<SnatchedTorrent, SnatchError> {
        let link = candidate
            .link
            .as_deref()
            .ok_or_else(|| SnatchError::Failed("no download link".to_string()))?;

        if link.starts_with("magnet:") {
            return Err(SnatchError::Magnet);
        }

        debug!(guid = %candidate.guid, tracker = %candidate.tracker, "Snatching candidate");

        let response = self.client.get(link).send().await.map_err(|e| {
            if e.is_timeout() {
                SnatchError::Failed("request timeout".to_string())
            } else {
                SnatchError::Failed(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SnatchError::RateLimited);
        }
        if !status.is_success() {
            return Err(SnatchError::Failed(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SnatchError::Failed(e.to_string()))?
            .to_vec();

        // Some indexers answer a torrent request with a magnet URI body.
        if bytes.starts_with(b"magnet:") {
            return Err(SnatchError::Magnet);
        }

        let metafile =
            metafile_from_bytes(&bytes).map_err(|e| SnatchError::Failed(e.to_string()))?;

        Ok(SnatchedTorrent { metafile, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(link: Option<&str>) -> Candidate {
        Candidate {
            name: "Release-GRP".to_string(),
            guid: "guid-1".to_string(),
            link: link.map(|s| s.to_string()),
            tracker: "t.example".to_string(),
            indexer_id: 1,
            size: None,
        }
    }

    #[tokio::test]
    async fn test_magnet_link_detected_before_io() {
        let snatcher = HttpSnatcher::new(5).unwrap();
        let err = snatcher
            .snatch(&candidate(Some("magnet:?xt=urn:btih:abc")))
            .await
            .unwrap_err();
        assert!(matches!(err, SnatchError::Magnet));
    }

    #[tokio::test]
    async fn test_missing_link_fails() {
        let snatcher = HttpSnatcher::new(5).unwrap();
        let err = snatcher.snatch(&candidate(None)).await.unwrap_err();
        assert!(matches!(err, SnatchError::Failed(_)));
    }
}
