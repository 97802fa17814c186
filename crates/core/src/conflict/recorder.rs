//! Collision recording policy.
//!
//! Collisions are only persisted for private-tracker content: public swarms
//! produce same-hash hits constantly and recording them is pure noise. The
//! payload pairs the candidate's trackers with the trackers the hash is
//! already known under; the upsert itself (including duplicate coalescing
//! across re-announced guids) lives in the decision store.

use crate::decide::{Decision, ResultAssessment};
use crate::model::normalize_tracker_set;
use crate::store::CollisionPayload;

/// The collision payload to persist for an assessment, if any.
///
/// `Some` iff the decision is the cross-tracker collision and the candidate
/// metafile is flagged private. Candidate trackers come from the tracker
/// mismatch when present, otherwise from the indexer's announce host.
pub fn collision_payload(
    assessment: &ResultAssessment,
    indexer_tracker: Option<&str>,
    known_trackers: Vec<String>,
) -> Option<CollisionPayload> {
    if assessment.decision != Decision::InfoHashAlreadyExistsAnotherTracker {
        return None;
    }
    let metafile = assessment.metafile.as_ref()?;
    if !metafile.is_private() {
        return None;
    }

    let candidate_trackers = match &assessment.tracker_mismatch {
        Some(trackers) => trackers.clone(),
        None => normalize_tracker_set(indexer_tracker.into_iter()),
    };

    Some(CollisionPayload {
        candidate_trackers,
        known_trackers: normalize_tracker_set(known_trackers.iter().map(|s| s.as_str())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metafile;

    fn meta(private: Option<bool>) -> Metafile {
        Metafile {
            info_hash: "a".repeat(40),
            name: "Show.S01".to_string(),
            length: 100,
            piece_length: 16384,
            files: vec![],
            trackers: vec![],
            private,
        }
    }

    fn assessment(decision: Decision, private: Option<bool>) -> ResultAssessment {
        ResultAssessment {
            decision,
            metafile: Some(meta(private)),
            meta_cached: true,
            tracker_mismatch: None,
        }
    }

    #[test]
    fn test_only_cross_tracker_collisions_recorded() {
        let a = assessment(Decision::InfoHashAlreadyExists, Some(true));
        assert!(collision_payload(&a, Some("t.example"), vec![]).is_none());

        let a = assessment(Decision::Match, Some(true));
        assert!(collision_payload(&a, Some("t.example"), vec![]).is_none());
    }

    #[test]
    fn test_public_candidates_not_recorded() {
        let a = assessment(Decision::InfoHashAlreadyExistsAnotherTracker, Some(false));
        assert!(collision_payload(&a, Some("t.example"), vec![]).is_none());

        // Unknown private flag counts as not private.
        let a = assessment(Decision::InfoHashAlreadyExistsAnotherTracker, None);
        assert!(collision_payload(&a, Some("t.example"), vec![]).is_none());
    }

    #[test]
    fn test_private_cross_tracker_recorded_with_fallback_tracker() {
        let a = assessment(Decision::InfoHashAlreadyExistsAnotherTracker, Some(true));
        let payload =
            collision_payload(&a, Some("T.Example"), vec!["known.example".to_string()]).unwrap();
        assert_eq!(payload.candidate_trackers, vec!["t.example"]);
        assert_eq!(payload.known_trackers, vec!["known.example"]);
    }

    #[test]
    fn test_mismatch_trackers_win_over_fallback() {
        let mut a = assessment(Decision::InfoHashAlreadyExistsAnotherTracker, Some(true));
        a.tracker_mismatch = Some(vec!["m1.example".to_string(), "m2.example".to_string()]);
        let payload = collision_payload(&a, Some("t.example"), vec![]).unwrap();
        assert_eq!(payload.candidate_trackers, vec!["m1.example", "m2.example"]);
    }

    #[test]
    fn test_empty_candidate_list_allowed_for_private() {
        let a = assessment(Decision::InfoHashAlreadyExistsAnotherTracker, Some(true));
        let payload = collision_payload(&a, None, vec![]).unwrap();
        assert!(payload.candidate_trackers.is_empty());
    }
}
