//! Collision recheck job.
//!
//! Sweeps cross-tracker collision rows whose incumbent has since left every
//! client, then re-searches the affected searchees so the freed-up matches
//! can actually be picked up.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::indexer::{BulkSearchOptions, BulkSearcher};
use crate::store::DecisionStore;

use super::types::{JobConfigOverride, JobError, JobExecutor};

pub struct CollisionRecheckJob {
    decisions: DecisionStore,
    searcher: Arc<dyn BulkSearcher>,
}

impl CollisionRecheckJob {
    pub fn new(decisions: DecisionStore, searcher: Arc<dyn BulkSearcher>) -> Self {
        Self {
            decisions,
            searcher,
        }
    }
}

#[async_trait]
impl JobExecutor for CollisionRecheckJob {
    async fn run(&self, _config_override: Option<JobConfigOverride>) -> Result<(), JobError> {
        let stale = self.decisions.stale_cross_tracker_collisions()?;
        if stale.is_empty() {
            debug!("No stale collisions");
            return Ok(());
        }

        let ids: Vec<i64> = stale.iter().map(|s| s.decision_id).collect();
        let deleted = self.decisions.delete_collisions(&ids)?;
        info!(deleted = deleted, "Swept stale collision rows");

        let names: Vec<String> = stale
            .into_iter()
            .map(|s| s.searchee_name)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // Force the searches to actually execute: without this the bulk
        // search would skip names searched recently.
        let options = BulkSearchOptions {
            exclude_recent_search: true,
        };
        let summary = self
            .searcher
            .bulk_search_by_names(&names, &options)
            .await
            .map_err(|e| JobError::Failed(e.to_string()))?;

        info!(
            requested = summary.requested,
            attempted = summary.attempted,
            found = summary.total_found,
            "Recheck searches dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decide::Decision;
    use crate::indexer::{BulkSearchSummary, SearchDispatchError};
    use crate::store::{CollisionPayload, Database};
    use std::sync::Mutex;

    struct RecordingSearcher {
        calls: Mutex<Vec<(Vec<String>, bool)>>,
    }

    #[async_trait]
    impl BulkSearcher for RecordingSearcher {
        async fn bulk_search_by_names(
            &self,
            names: &[String],
            options: &BulkSearchOptions,
        ) -> Result<BulkSearchSummary, SearchDispatchError> {
            self.calls
                .lock()
                .unwrap()
                .push((names.to_vec(), options.exclude_recent_search));
            Ok(BulkSearchSummary {
                attempted: names.len(),
                requested: names.len(),
                total_found: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_sweeps_stale_and_researches() {
        let db = Database::in_memory().unwrap();
        let decisions = DecisionStore::new(db);
        let payload = CollisionPayload {
            candidate_trackers: vec!["a.example".to_string()],
            known_trackers: vec!["b.example".to_string()],
        };
        let id = decisions
            .record_assessment(
                "Show.S01",
                "guid-1",
                Some(&"f".repeat(40)),
                Decision::InfoHashAlreadyExistsAnotherTracker,
                0.02,
                Some(&payload),
            )
            .unwrap();
        assert!(decisions.collision(id).unwrap().is_some());

        let searcher = Arc::new(RecordingSearcher {
            calls: Mutex::new(Vec::new()),
        });
        CollisionRecheckJob::new(decisions.clone(), searcher.clone())
            .run(None)
            .await
            .unwrap();

        // Collision gone, search dispatched with the recent-search override.
        assert!(decisions.collision(id).unwrap().is_none());
        let calls = searcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec!["Show.S01".to_string()]);
        assert!(calls[0].1);
    }

    #[tokio::test]
    async fn test_no_stale_rows_no_search() {
        let decisions = DecisionStore::new(Database::in_memory().unwrap());
        let searcher = Arc::new(RecordingSearcher {
            calls: Mutex::new(Vec::new()),
        });
        CollisionRecheckJob::new(decisions, searcher.clone())
            .run(None)
            .await
            .unwrap();
        assert!(searcher.calls.lock().unwrap().is_empty());
    }
}
