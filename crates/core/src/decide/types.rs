//! Decision taxonomy and assessment results.

use serde::{Deserialize, Serialize};

use crate::model::Metafile;

/// How strictly candidate file trees must agree with the searchee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Only exact file-tree matches are injectable.
    Strict,
    /// Size-only bijections are acceptable.
    Flexible,
    /// Size-only plus partial piece-coverage matches.
    Partial,
}

/// Exhaustive classification of a candidate against a searchee.
///
/// Every assessment produces exactly one of these tags; they are persisted
/// as their SCREAMING_SNAKE string form in the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    // Content agreement.
    Match,
    MatchSizeOnly,
    MatchPartial,
    // Content disagreement.
    SizeMismatch,
    PartialSizeMismatch,
    FileTreeMismatch,
    // Pre-filter rejections (candidate form only).
    ReleaseGroupMismatch,
    ResolutionMismatch,
    SourceMismatch,
    ProperRepackMismatch,
    FuzzySizeMismatch,
    NoDownloadLink,
    BlockedRelease,
    // I/O and protocol.
    MagnetLink,
    RateLimited,
    DownloadFailed,
    // Identity collisions.
    SameInfoHash,
    InfoHashAlreadyExists,
    InfoHashAlreadyExistsAnotherTracker,
}

impl Decision {
    /// Whether this decision is injectable content agreement.
    pub fn is_match(&self) -> bool {
        matches!(
            self,
            Decision::Match | Decision::MatchSizeOnly | Decision::MatchPartial
        )
    }

    /// Whether the candidate's info-hash already exists locally.
    pub fn is_collision(&self) -> bool {
        matches!(
            self,
            Decision::SameInfoHash
                | Decision::InfoHashAlreadyExists
                | Decision::InfoHashAlreadyExistsAnotherTracker
        )
    }

    /// The stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Match => "MATCH",
            Decision::MatchSizeOnly => "MATCH_SIZE_ONLY",
            Decision::MatchPartial => "MATCH_PARTIAL",
            Decision::SizeMismatch => "SIZE_MISMATCH",
            Decision::PartialSizeMismatch => "PARTIAL_SIZE_MISMATCH",
            Decision::FileTreeMismatch => "FILE_TREE_MISMATCH",
            Decision::ReleaseGroupMismatch => "RELEASE_GROUP_MISMATCH",
            Decision::ResolutionMismatch => "RESOLUTION_MISMATCH",
            Decision::SourceMismatch => "SOURCE_MISMATCH",
            Decision::ProperRepackMismatch => "PROPER_REPACK_MISMATCH",
            Decision::FuzzySizeMismatch => "FUZZY_SIZE_MISMATCH",
            Decision::NoDownloadLink => "NO_DOWNLOAD_LINK",
            Decision::BlockedRelease => "BLOCKED_RELEASE",
            Decision::MagnetLink => "MAGNET_LINK",
            Decision::RateLimited => "RATE_LIMITED",
            Decision::DownloadFailed => "DOWNLOAD_FAILED",
            Decision::SameInfoHash => "SAME_INFO_HASH",
            Decision::InfoHashAlreadyExists => "INFO_HASH_ALREADY_EXISTS",
            Decision::InfoHashAlreadyExistsAnotherTracker => {
                "INFO_HASH_ALREADY_EXISTS_ANOTHER_TRACKER"
            }
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Decision> {
        Some(match s {
            "MATCH" => Decision::Match,
            "MATCH_SIZE_ONLY" => Decision::MatchSizeOnly,
            "MATCH_PARTIAL" => Decision::MatchPartial,
            "SIZE_MISMATCH" => Decision::SizeMismatch,
            "PARTIAL_SIZE_MISMATCH" => Decision::PartialSizeMismatch,
            "FILE_TREE_MISMATCH" => Decision::FileTreeMismatch,
            "RELEASE_GROUP_MISMATCH" => Decision::ReleaseGroupMismatch,
            "RESOLUTION_MISMATCH" => Decision::ResolutionMismatch,
            "SOURCE_MISMATCH" => Decision::SourceMismatch,
            "PROPER_REPACK_MISMATCH" => Decision::ProperRepackMismatch,
            "FUZZY_SIZE_MISMATCH" => Decision::FuzzySizeMismatch,
            "NO_DOWNLOAD_LINK" => Decision::NoDownloadLink,
            "BLOCKED_RELEASE" => Decision::BlockedRelease,
            "MAGNET_LINK" => Decision::MagnetLink,
            "RATE_LIMITED" => Decision::RateLimited,
            "DOWNLOAD_FAILED" => Decision::DownloadFailed,
            "SAME_INFO_HASH" => Decision::SameInfoHash,
            "INFO_HASH_ALREADY_EXISTS" => Decision::InfoHashAlreadyExists,
            "INFO_HASH_ALREADY_EXISTS_ANOTHER_TRACKER" => {
                Decision::InfoHashAlreadyExistsAnotherTracker
            }
            _ => return None,
        })
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of assessing one candidate against one searchee.
#[derive(Debug, Clone)]
pub struct ResultAssessment {
    /// The decision tag.
    pub decision: Decision,
    /// The parsed metafile, present when the candidate was snatched.
    pub metafile: Option<Metafile>,
    /// Whether the metafile was written to the torrent cache.
    pub meta_cached: bool,
    /// The candidate's normalized tracker set when it differs from the
    /// searchee's known trackers. Drives conflict resolution.
    pub tracker_mismatch: Option<Vec<String>>,
}

impl ResultAssessment {
    /// A bare decision with no snatched metafile.
    pub fn rejection(decision: Decision) -> Self {
        Self {
            decision,
            metafile: None,
            meta_cached: false,
            tracker_mismatch: None,
        }
    }
}
