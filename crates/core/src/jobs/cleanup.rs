//! Database and torrent-cache cleanup job.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cache::TorrentCache;
use crate::store::DecisionStore;

use super::types::{JobConfigOverride, JobError, JobExecutor};

/// Prunes stale decision rows, then removes cache files whose info-hash is
/// no longer referenced by any decision.
pub struct CleanupJob {
    decisions: DecisionStore,
    cache: TorrentCache,
    prune_after: chrono::Duration,
}

impl CleanupJob {
    pub fn new(decisions: DecisionStore, cache: TorrentCache) -> Self {
        Self {
            decisions,
            cache,
            prune_after: chrono::Duration::days(365),
        }
    }

    pub fn with_prune_after(mut self, prune_after: chrono::Duration) -> Self {
        self.prune_after = prune_after;
        self
    }
}

#[async_trait]
impl JobExecutor for CleanupJob {
    async fn run(&self, _config_override: Option<JobConfigOverride>) -> Result<(), JobError> {
        let cutoff = Utc::now() - self.prune_after;
        let pruned = self.decisions.prune_older_than(cutoff)?;
        if pruned > 0 {
            info!(pruned = pruned, "Pruned stale decisions");
        }

        let referenced = self.decisions.referenced_info_hashes()?;
        let cached = self
            .cache
            .list_hashes()
            .map_err(|e| JobError::Failed(e.to_string()))?;

        let mut removed = 0usize;
        for hash in cached {
            if !referenced.contains(&hash) {
                match self.cache.remove(&hash) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(info_hash = %hash, error = %e, "Orphan removal failed"),
                }
            }
        }
        debug!(removed = removed, "Cleanup sweep complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decide::Decision;
    use crate::store::Database;

    #[tokio::test]
    async fn test_orphan_cache_files_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TorrentCache::new(dir.path()).unwrap();
        let decisions = DecisionStore::new(Database::in_memory().unwrap());

        let referenced = "a".repeat(40);
        let orphan = "b".repeat(40);
        decisions
            .record_assessment("X", "guid-1", Some(&referenced), Decision::Match, 0.02, None)
            .unwrap();
        cache.store(&referenced, b"payload").unwrap();
        cache.store(&orphan, b"payload").unwrap();

        CleanupJob::new(decisions, cache.clone()).run(None).await.unwrap();

        assert!(cache.contains(&referenced));
        assert!(!cache.contains(&orphan));
    }

    #[tokio::test]
    async fn test_pruned_decisions_orphan_their_cache_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TorrentCache::new(dir.path()).unwrap();
        let decisions = DecisionStore::new(Database::in_memory().unwrap());

        let hash = "c".repeat(40);
        decisions
            .record_assessment("X", "guid-1", Some(&hash), Decision::Match, 0.02, None)
            .unwrap();
        cache.store(&hash, b"payload").unwrap();

        // Prune-everything window: the decision goes, and with it the file.
        CleanupJob::new(decisions.clone(), cache.clone())
            .with_prune_after(chrono::Duration::days(-1))
            .run(None)
            .await
            .unwrap();

        assert_eq!(decisions.count().unwrap(), 0);
        assert!(!cache.contains(&hash));
    }
}
