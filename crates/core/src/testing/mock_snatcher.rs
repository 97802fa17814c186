//! Mock snatcher for testing.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::indexer::{SnatchError, SnatchedTorrent, Snatcher};
use crate::model::Candidate;

/// Scripted [`Snatcher`]: responses are served in push order, and every
/// snatched guid is recorded for assertions.
#[derive(Default)]
pub struct MockSnatcher {
    responses: Mutex<VecDeque<Result<SnatchedTorrent, SnatchError>>>,
    calls: Mutex<Vec<String>>,
}

impl MockSnatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_ok(&self, snatched: SnatchedTorrent) {
        self.responses.lock().await.push_back(Ok(snatched));
    }

    pub async fn push_err(&self, err: SnatchError) {
        self.responses.lock().await.push_back(Err(err));
    }

    /// Guids snatched so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl Snatcher for MockSnatcher {
    async fn snatch(&self, candidate: &Candidate) -> Result<SnatchedTorrent, SnatchError> {
        self.calls.lock().await.push(candidate.guid.clone());
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(SnatchError::Failed("no scripted response".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TorrentFixture;

    fn candidate() -> Candidate {
        Candidate {
            name: "X".to_string(),
            guid: "guid-1".to_string(),
            link: None,
            tracker: "t.example".to_string(),
            indexer_id: 1,
            size: None,
        }
    }

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let snatcher = MockSnatcher::new();
        snatcher.push_err(SnatchError::RateLimited).await;
        let fixture = TorrentFixture::new("X").file("a.mkv", 100).build();
        snatcher.push_ok(fixture.snatched()).await;

        assert!(matches!(
            snatcher.snatch(&candidate()).await,
            Err(SnatchError::RateLimited)
        ));
        assert!(snatcher.snatch(&candidate()).await.is_ok());
        // Exhausted: defaults to a failure.
        assert!(matches!(
            snatcher.snatch(&candidate()).await,
            Err(SnatchError::Failed(_))
        ));
        assert_eq!(snatcher.calls().await.len(), 3);
    }
}
