//! Conflict-rule resolution and incumbent eviction.

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::TorrentClient;
use crate::model::normalize_tracker_set;
use crate::store::{
    ClientSearcheeStore, ConflictRule, ConflictRuleStore, IndexerStore, StoreError,
};

/// Decides between same-info-hash seeds using the operator's priority rules
/// and drives the client drivers to evict a losing incumbent.
pub struct ConflictResolver {
    rules: ConflictRuleStore,
    indexers: IndexerStore,
    clients: ClientSearcheeStore,
    drivers: Vec<Arc<dyn TorrentClient>>,
}

impl ConflictResolver {
    pub fn new(
        rules: ConflictRuleStore,
        indexers: IndexerStore,
        clients: ClientSearcheeStore,
        drivers: Vec<Arc<dyn TorrentClient>>,
    ) -> Self {
        Self {
            rules,
            indexers,
            clients,
            drivers,
        }
    }

    /// Returns true iff the incumbent holding `info_hash` was evicted.
    ///
    /// Any failure along the way leaves all state untouched and yields
    /// false; the caller then treats the candidate as still excluded.
    pub async fn resolve_conflict_rules(
        &self,
        info_hash: &str,
        candidate_trackers: &[String],
        searchee_name: &str,
    ) -> bool {
        match self
            .try_resolve(info_hash, candidate_trackers, searchee_name)
            .await
        {
            Ok(evicted) => evicted,
            Err(e) => {
                warn!(
                    info_hash = info_hash,
                    searchee = searchee_name,
                    error = %e,
                    "Conflict resolution aborted"
                );
                false
            }
        }
    }

    async fn try_resolve(
        &self,
        info_hash: &str,
        candidate_trackers: &[String],
        searchee_name: &str,
    ) -> Result<bool, StoreError> {
        if candidate_trackers.is_empty() {
            return Ok(false);
        }

        let rules = self.rules.get_rules()?;
        if rules.is_empty() {
            return Ok(false);
        }
        let indexer_trackers = self.indexers.all_trackers()?;

        let candidate_trackers =
            normalize_tracker_set(candidate_trackers.iter().map(|s| s.as_str()));
        let Some(candidate_priority) =
            best_priority(&candidate_trackers, &rules, &indexer_trackers)
        else {
            // No rule covers the candidate: it can never outrank anything.
            return Ok(false);
        };

        let incumbent_rows = self.clients.rows_for_hash(info_hash)?;
        if incumbent_rows.is_empty() {
            return Ok(false);
        }
        let incumbent_trackers = normalize_tracker_set(
            incumbent_rows
                .iter()
                .flat_map(|r| r.trackers.iter())
                .map(|s| s.as_str()),
        );
        // An incumbent no rule covers sits below every matching rule.
        let incumbent_priority = best_priority(&incumbent_trackers, &rules, &indexer_trackers)
            .unwrap_or(rules.len());

        if candidate_priority >= incumbent_priority {
            // Equal priority keeps the incumbent.
            return Ok(false);
        }

        // All-or-nothing eviction: every owning client must confirm removal
        // before any database row is touched.
        for row in &incumbent_rows {
            let Some(driver) = self.drivers.iter().find(|d| d.host() == row.client_host) else {
                warn!(
                    client = %row.client_host,
                    info_hash = info_hash,
                    "No driver for client holding incumbent, aborting eviction"
                );
                return Ok(false);
            };

            if let Err(e) = driver.remove_torrent(info_hash, false).await {
                warn!(client = %row.client_host, error = %e, "Incumbent removal failed");
                return Ok(false);
            }

            match driver.is_torrent_in_client(info_hash).await {
                Ok(false) => {}
                Ok(true) => {
                    warn!(client = %row.client_host, "Incumbent still present after removal");
                    return Ok(false);
                }
                Err(e) => {
                    warn!(client = %row.client_host, error = %e, "Could not verify removal");
                    return Ok(false);
                }
            }
        }

        self.clients.delete_by_hash(info_hash)?;
        crate::metrics::EVICTIONS_TOTAL.inc();
        info!(
            info_hash = info_hash,
            searchee = searchee_name,
            candidate_priority = candidate_priority + 1,
            incumbent_priority = incumbent_priority + 1,
            "Evicted incumbent in favor of higher-priority tracker"
        );
        Ok(true)
    }
}

/// The 0-based index of the first rule matching any of the trackers, i.e.
/// the best (lowest) priority band the tracker set falls into.
fn best_priority(
    trackers: &[String],
    rules: &[ConflictRule],
    indexer_trackers: &[String],
) -> Option<usize> {
    trackers
        .iter()
        .filter_map(|t| rule_index(t, rules, indexer_trackers))
        .min()
}

fn rule_index(tracker: &str, rules: &[ConflictRule], indexer_trackers: &[String]) -> Option<usize> {
    rules.iter().position(|rule| {
        if rule.all_indexers {
            indexer_trackers.iter().any(|t| t == tracker)
        } else {
            rule.trackers.iter().any(|t| t == tracker)
        }
    })
}
