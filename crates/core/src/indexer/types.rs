//! Types for indexer collaborators.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Candidate, Metafile};

/// Errors from snatching a candidate's `.torrent` file.
///
/// The decision engine maps these 1:1 onto decisions: magnet links and rate
/// limits are ordinary outcomes, not faults.
#[derive(Debug, Error)]
pub enum SnatchError {
    #[error("Listing only offers a magnet link")]
    Magnet,

    #[error("Indexer rate limited the request")]
    RateLimited,

    #[error("Download failed: {0}")]
    Failed(String),
}

/// A successfully snatched torrent: parsed form plus the original bytes,
/// which the cache persists verbatim.
#[derive(Debug, Clone)]
pub struct SnatchedTorrent {
    pub metafile: Metafile,
    pub bytes: Vec<u8>,
}

/// Fetches and parses a candidate's `.torrent` file.
#[async_trait]
pub trait Snatcher: Send + Sync {
    async fn snatch(&self, candidate: &Candidate) -> Result<SnatchedTorrent, SnatchError>;
}

/// Options for a bulk search dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkSearchOptions {
    /// Force searches to run even for recently searched names.
    #[serde(default)]
    pub exclude_recent_search: bool,
}

/// Outcome counts of a bulk search dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkSearchSummary {
    /// Names for which a search was actually executed.
    pub attempted: usize,
    /// Names requested.
    pub requested: usize,
    /// Total candidates found across all searches.
    pub total_found: usize,
}

/// Errors from dispatching bulk searches.
#[derive(Debug, Error)]
pub enum SearchDispatchError {
    #[error("No names given")]
    Empty,

    #[error("Too many names: {given} (limit {limit})")]
    TooMany { given: usize, limit: usize },

    #[error("Search dispatch failed: {0}")]
    Failed(String),
}

/// Runs a search for each given searchee name across configured indexers.
#[async_trait]
pub trait BulkSearcher: Send + Sync {
    async fn bulk_search_by_names(
        &self,
        names: &[String],
        options: &BulkSearchOptions,
    ) -> Result<BulkSearchSummary, SearchDispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snatch_error_display() {
        assert_eq!(
            SnatchError::Magnet.to_string(),
            "Listing only offers a magnet link"
        );
        assert_eq!(
            SnatchError::Failed("HTTP 500".to_string()).to_string(),
            "Download failed: HTTP 500"
        );
    }

    #[test]
    fn test_bulk_search_summary_serialization() {
        let summary = BulkSearchSummary {
            attempted: 2,
            requested: 3,
            total_found: 17,
        };
        let json = serde_json::to_string(&summary).unwrap();
        let parsed: BulkSearchSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.attempted, 2);
        assert_eq!(parsed.requested, 3);
        assert_eq!(parsed.total_found, 17);
    }
}
