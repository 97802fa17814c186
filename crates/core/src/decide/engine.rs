//! Assessment pipeline.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{GuidInfoHashMap, TorrentCache};
use crate::conflict::{collision_payload, ConflictResolver};
use crate::config::MatchingConfig;
use crate::indexer::{SnatchError, SnatchedTorrent, Snatcher};
use crate::metrics;
use crate::model::{
    normalize_tracker_set, tracker_sets_equal, Candidate, Metafile, Searchee, SearcheeLabel,
};
use crate::release;
use crate::store::{ClientSearcheeStore, DecisionStore, IndexerStore, StoreError};

use super::types::{Decision, MatchMode, ResultAssessment};
use super::{compare, prefilter};

const SNATCH_RETRIES: u32 = 4;
const SNATCH_RETRY_DELAY: Duration = Duration::from_secs(60);
const SNATCH_RETRY_DELAY_ANNOUNCE: Duration = Duration::from_secs(300);

/// What the engine is asked to assess: a raw candidate requiring the full
/// pipeline, or an already-parsed metafile the caller vouches for.
pub enum AssessmentInput {
    Candidate(Candidate),
    Metafile(Metafile),
}

/// Per-run configuration overrides, carried by scheduled jobs.
#[derive(Debug, Clone, Default)]
pub struct AssessmentOverrides {
    pub match_mode: Option<MatchMode>,
    pub include_single_episodes: Option<bool>,
    pub fuzzy_size_factor: Option<f64>,
    pub min_size_ratio: Option<f64>,
}

/// The decision engine. Pure logic plus its collaborators: snatcher, cache,
/// correlation map, stores and the conflict resolver.
pub struct DecisionEngine {
    matching: MatchingConfig,
    snatcher: Arc<dyn Snatcher>,
    cache: TorrentCache,
    guid_map: Arc<GuidInfoHashMap>,
    decisions: DecisionStore,
    indexers: IndexerStore,
    clients: ClientSearcheeStore,
    resolver: Arc<ConflictResolver>,
}

impl DecisionEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        matching: MatchingConfig,
        snatcher: Arc<dyn Snatcher>,
        cache: TorrentCache,
        guid_map: Arc<GuidInfoHashMap>,
        decisions: DecisionStore,
        indexers: IndexerStore,
        clients: ClientSearcheeStore,
        resolver: Arc<ConflictResolver>,
    ) -> Self {
        Self {
            matching,
            snatcher,
            cache,
            guid_map,
            decisions,
            indexers,
            clients,
            resolver,
        }
    }

    /// Assess a candidate or metafile against a searchee.
    ///
    /// Every path yields a [`ResultAssessment`]; I/O failures map onto
    /// decisions rather than errors. A successful eviction removes the hash
    /// from `excluded` and the candidate proceeds to content matching.
    pub async fn assess(
        &self,
        input: AssessmentInput,
        searchee: &Searchee,
        excluded: &mut HashSet<String>,
        block_list: &[String],
        overrides: &AssessmentOverrides,
    ) -> ResultAssessment {
        let assessment = self
            .assess_inner(input, searchee, excluded, block_list, overrides)
            .await;
        metrics::DECISIONS_TOTAL
            .with_label_values(&[assessment.decision.as_str()])
            .inc();
        assessment
    }

    async fn assess_inner(
        &self,
        input: AssessmentInput,
        searchee: &Searchee,
        excluded: &mut HashSet<String>,
        block_list: &[String],
        overrides: &AssessmentOverrides,
    ) -> ResultAssessment {
        if prefilter::is_blocked(&searchee.title, block_list) {
            return ResultAssessment::rejection(Decision::BlockedRelease);
        }

        let (meta, meta_cached, indexer_tracker) = match input {
            AssessmentInput::Candidate(candidate) => {
                let fuzzy = overrides
                    .fuzzy_size_factor
                    .unwrap_or_else(|| self.matching.fuzzy_size_factor(searchee));
                if let Some(decision) = prefilter::run(&candidate, searchee, fuzzy) {
                    return ResultAssessment::rejection(decision);
                }

                let snatched = match self.snatch_with_retries(&candidate, searchee.label).await {
                    Ok(snatched) => snatched,
                    Err(SnatchError::Magnet) => {
                        return ResultAssessment::rejection(Decision::MagnetLink)
                    }
                    Err(SnatchError::RateLimited) => {
                        return ResultAssessment::rejection(Decision::RateLimited)
                    }
                    Err(SnatchError::Failed(e)) => {
                        debug!(guid = %candidate.guid, error = %e, "Snatch gave up");
                        return ResultAssessment::rejection(Decision::DownloadFailed);
                    }
                };

                let SnatchedTorrent { metafile, bytes } = snatched;
                let meta_cached = match self.cache.store(&metafile.info_hash, &bytes) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(info_hash = %metafile.info_hash, error = %e, "Cache write failed");
                        false
                    }
                };
                self.guid_map
                    .insert(&candidate.guid, candidate.link.as_deref(), &metafile.info_hash)
                    .await;

                // Append-only union into the originating indexer's set.
                let mut observed = metafile.tracker_hosts();
                observed.push(candidate.tracker.clone());
                if let Err(e) = self.indexers.merge_trackers(candidate.indexer_id, &observed) {
                    warn!(indexer_id = candidate.indexer_id, error = %e, "Tracker merge failed");
                }

                (metafile, meta_cached, Some(candidate.tracker))
            }
            AssessmentInput::Metafile(meta) => (meta, false, None),
        };

        if prefilter::is_blocked(&meta.name, block_list) {
            return with_meta(Decision::BlockedRelease, meta, meta_cached, None);
        }

        self.assess_meta(
            meta,
            meta_cached,
            indexer_tracker.as_deref(),
            searchee,
            excluded,
            overrides,
        )
        .await
    }

    async fn assess_meta(
        &self,
        meta: Metafile,
        meta_cached: bool,
        indexer_tracker: Option<&str>,
        searchee: &Searchee,
        excluded: &mut HashSet<String>,
        overrides: &AssessmentOverrides,
    ) -> ResultAssessment {
        let hash = meta.info_hash.to_lowercase();
        let meta_hosts = meta.tracker_hosts();

        // Identity against the searchee itself.
        if searchee
            .info_hash
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(&hash))
        {
            let searchee_hosts = searchee.tracker_hosts();
            return if tracker_sets_equal(
                meta_hosts.iter().map(|s| s.as_str()),
                searchee_hosts.iter().map(|s| s.as_str()),
            ) {
                with_meta(Decision::SameInfoHash, meta, meta_cached, None)
            } else {
                with_meta(
                    Decision::InfoHashAlreadyExistsAnotherTracker,
                    meta,
                    meta_cached,
                    Some(meta_hosts),
                )
            };
        }

        // Identity against everything else held locally.
        if excluded.contains(&hash) {
            let known = self.known_trackers(&hash);
            let mismatch = !tracker_sets_equal(
                meta_hosts.iter().map(|s| s.as_str()),
                known.iter().map(|s| s.as_str()),
            );

            let candidate_trackers = if mismatch {
                meta_hosts.clone()
            } else {
                normalize_tracker_set(indexer_tracker.into_iter())
            };

            if self
                .resolver
                .resolve_conflict_rules(&hash, &candidate_trackers, &searchee.title)
                .await
            {
                excluded.remove(&hash);
                // Incumbent gone; the candidate competes on content now.
            } else {
                let decision = if mismatch {
                    Decision::InfoHashAlreadyExistsAnotherTracker
                } else {
                    Decision::InfoHashAlreadyExists
                };
                return with_meta(decision, meta, meta_cached, mismatch.then_some(meta_hosts));
            }
        }

        // Season-pack guard: a lone episode can't stand in for a pack.
        let include_singles = overrides
            .include_single_episodes
            .unwrap_or(self.matching.include_single_episodes);
        if release::is_season_pack(&searchee.title)
            && release::is_single_episode(&meta.name)
            && !include_singles
        {
            return with_meta(Decision::FileTreeMismatch, meta, meta_cached, None);
        }

        let decision = self.match_content(&meta, searchee, overrides);
        with_meta(decision, meta, meta_cached, None)
    }

    fn match_content(
        &self,
        meta: &Metafile,
        searchee: &Searchee,
        overrides: &AssessmentOverrides,
    ) -> Decision {
        if compare::compare_file_trees(meta, searchee) {
            return Decision::Match;
        }

        let mode = overrides.match_mode.unwrap_or(self.matching.match_mode);
        let bijection = compare::sizes_biject(&meta.files, &searchee.files);
        match mode {
            MatchMode::Strict => {
                if bijection {
                    Decision::FileTreeMismatch
                } else {
                    Decision::SizeMismatch
                }
            }
            MatchMode::Flexible => {
                if bijection {
                    Decision::MatchSizeOnly
                } else {
                    Decision::SizeMismatch
                }
            }
            MatchMode::Partial => {
                if bijection {
                    return Decision::MatchSizeOnly;
                }
                let ratio = overrides
                    .min_size_ratio
                    .unwrap_or_else(|| self.matching.min_size_ratio(searchee));
                let matched = compare::matched_length(&meta.files, &searchee.files);
                if compare::piece_coverage(matched, meta.piece_length, meta.length) < ratio {
                    return Decision::PartialSizeMismatch;
                }
                let verified = compare::matched_length_verified(meta, searchee);
                if compare::piece_coverage(verified, meta.piece_length, meta.length) < ratio {
                    return Decision::FileTreeMismatch;
                }
                Decision::MatchPartial
            }
        }
    }

    /// Caching wrapper around [`assess`]: consult the decision table first,
    /// short-circuit known collisions, and persist the outcome.
    pub async fn assess_candidate_caching(
        &self,
        candidate: &Candidate,
        searchee: &Searchee,
        excluded: &mut HashSet<String>,
        block_list: &[String],
        overrides: &AssessmentOverrides,
    ) -> Result<ResultAssessment, StoreError> {
        let fuzzy = overrides
            .fuzzy_size_factor
            .unwrap_or_else(|| self.matching.fuzzy_size_factor(searchee));

        let prior = self.decisions.get(&searchee.title, &candidate.guid)?;
        let known_hash = match &prior {
            Some(row) => row.info_hash.clone(),
            None => {
                self.guid_map
                    .get(&candidate.guid, candidate.link.as_deref())
                    .await
            }
        };

        // Known collision: skip the snatch entirely, refresh the record and
        // give conflict resolution another chance.
        if let Some(hash) = known_hash.filter(|h| excluded.contains(h)) {
            // A previously matched decision is preserved rather than
            // regressed to a collision tag.
            let decision = match &prior {
                Some(row) if row.decision.is_match() => row.decision,
                _ => Decision::InfoHashAlreadyExistsAnotherTracker,
            };

            let metafile = self.cache.load(&hash).unwrap_or_default();
            let known = self.known_trackers(&hash);
            let candidate_hosts = normalize_tracker_set(std::iter::once(candidate.tracker.as_str()));

            let evicted = self
                .resolver
                .resolve_conflict_rules(&hash, &candidate_hosts, &searchee.title)
                .await;
            if evicted {
                excluded.remove(&hash);
            }

            let assessment = ResultAssessment {
                decision,
                meta_cached: metafile.is_some(),
                metafile,
                tracker_mismatch: None,
            };

            let payload = if evicted {
                None
            } else {
                collision_payload(&assessment, Some(&candidate.tracker), known)
            };
            if payload.is_some() {
                metrics::COLLISIONS_RECORDED_TOTAL.inc();
            }
            self.decisions.record_assessment(
                &searchee.title,
                &candidate.guid,
                Some(&hash),
                decision,
                fuzzy,
                payload.as_ref(),
            )?;
            metrics::DECISIONS_TOTAL
                .with_label_values(&[decision.as_str()])
                .inc();
            return Ok(assessment);
        }

        let assessment = self
            .assess(
                AssessmentInput::Candidate(candidate.clone()),
                searchee,
                excluded,
                block_list,
                overrides,
            )
            .await;

        let info_hash = assessment
            .metafile
            .as_ref()
            .map(|m| m.info_hash.to_lowercase());
        let known = info_hash
            .as_deref()
            .map(|h| self.known_trackers(h))
            .unwrap_or_default();
        let payload = collision_payload(&assessment, Some(&candidate.tracker), known);
        if payload.is_some() {
            metrics::COLLISIONS_RECORDED_TOTAL.inc();
        }
        self.decisions.record_assessment(
            &searchee.title,
            &candidate.guid,
            info_hash.as_deref(),
            assessment.decision,
            fuzzy,
            payload.as_ref(),
        )?;
        Ok(assessment)
    }

    async fn snatch_with_retries(
        &self,
        candidate: &Candidate,
        label: SearcheeLabel,
    ) -> Result<SnatchedTorrent, SnatchError> {
        let delay = if label == SearcheeLabel::Announce {
            SNATCH_RETRY_DELAY_ANNOUNCE
        } else {
            SNATCH_RETRY_DELAY
        };

        let mut retries = 0;
        loop {
            match self.snatcher.snatch(candidate).await {
                Ok(snatched) => {
                    metrics::SNATCHES_TOTAL.with_label_values(&["ok"]).inc();
                    return Ok(snatched);
                }
                Err(SnatchError::Magnet) => {
                    metrics::SNATCHES_TOTAL.with_label_values(&["magnet"]).inc();
                    return Err(SnatchError::Magnet);
                }
                Err(SnatchError::RateLimited) => {
                    metrics::SNATCHES_TOTAL
                        .with_label_values(&["rate_limited"])
                        .inc();
                    return Err(SnatchError::RateLimited);
                }
                Err(SnatchError::Failed(e)) => {
                    retries += 1;
                    if retries > SNATCH_RETRIES {
                        metrics::SNATCHES_TOTAL.with_label_values(&["failed"]).inc();
                        return Err(SnatchError::Failed(e));
                    }
                    warn!(
                        guid = %candidate.guid,
                        retry = retries,
                        error = %e,
                        "Snatch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn known_trackers(&self, info_hash: &str) -> Vec<String> {
        match self.clients.rows_for_hash(info_hash) {
            Ok(rows) => normalize_tracker_set(
                rows.iter()
                    .flat_map(|r| r.trackers.iter())
                    .map(|s| s.as_str()),
            ),
            Err(e) => {
                warn!(info_hash = info_hash, error = %e, "Client tracker lookup failed");
                Vec::new()
            }
        }
    }
}

fn with_meta(
    decision: Decision,
    metafile: Metafile,
    meta_cached: bool,
    tracker_mismatch: Option<Vec<String>>,
) -> ResultAssessment {
    ResultAssessment {
        decision,
        metafile: Some(metafile),
        meta_cached,
        tracker_mismatch,
    }
}
