//! Core value types: searchees, candidates and parsed metafiles.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single file inside a torrent or a local dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Full path within the torrent (root name included for multi-file).
    pub path: String,
    /// Basename only.
    pub name: String,
    /// Size in bytes.
    pub length: u64,
}

impl FileEntry {
    /// Build an entry from a slash-joined path, deriving the basename.
    pub fn from_path(path: impl Into<String>, length: u64) -> Self {
        let path = path.into();
        let name = path
            .rsplit('/')
            .next()
            .unwrap_or(path.as_str())
            .to_string();
        Self { path, name, length }
    }
}

/// A parsed `.torrent` file. Immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metafile {
    /// SHA-1 over the info dictionary, 40-char lowercase hex.
    pub info_hash: String,
    /// Torrent name (root directory for multi-file torrents).
    pub name: String,
    /// Total payload bytes.
    pub length: u64,
    /// Piece size in bytes.
    pub piece_length: u64,
    /// Ordered file list.
    pub files: Vec<FileEntry>,
    /// Announce URLs, tier order preserved.
    pub trackers: Vec<String>,
    /// The info dict `private` flag; `None` when the key is absent.
    pub private: Option<bool>,
}

impl Metafile {
    /// Whether the torrent is flagged private. Absent counts as not private.
    pub fn is_private(&self) -> bool {
        self.private == Some(true)
    }

    /// Normalized tracker hostnames for set comparisons.
    pub fn tracker_hosts(&self) -> Vec<String> {
        super::tracker::normalize_tracker_set(
            self.trackers
                .iter()
                .filter_map(|u| super::tracker::tracker_host(u)),
        )
    }
}

/// Provenance of a searchee, i.e. which entry point produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearcheeLabel {
    Search,
    Announce,
    Rss,
    Inject,
    Webhook,
}

impl SearcheeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearcheeLabel::Search => "search",
            SearcheeLabel::Announce => "announce",
            SearcheeLabel::Rss => "rss",
            SearcheeLabel::Inject => "inject",
            SearcheeLabel::Webhook => "webhook",
        }
    }
}

/// Local seeded content serving as the reference for cross-seed search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Searchee {
    /// Canonical name used for decision keys.
    pub title: String,
    /// Present for client-sourced searchees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    /// Present for filesystem-sourced searchees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// File list of the seeded content.
    pub files: Vec<FileEntry>,
    /// Total bytes.
    pub length: u64,
    /// Announce hosts the searchee is already known under.
    #[serde(default)]
    pub trackers: Vec<String>,
    /// Where this searchee came from.
    pub label: SearcheeLabel,
}

impl Searchee {
    /// Whether file comparisons should key on full paths rather than names.
    ///
    /// Client- and filesystem-sourced searchees have authoritative paths.
    pub fn compare_by_path(&self) -> bool {
        self.info_hash.is_some() || self.path.is_some()
    }

    /// Normalized tracker set for identity comparisons.
    pub fn tracker_hosts(&self) -> Vec<String> {
        super::tracker::normalize_tracker_set(self.trackers.iter().cloned())
    }
}

/// A search hit from an indexer, before the torrent itself is fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Release name as listed by the indexer.
    pub name: String,
    /// Indexer-unique id for this listing.
    pub guid: String,
    /// Download URL for the `.torrent`; absent listings cannot be snatched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Announce host for this indexer.
    pub tracker: String,
    /// Which configured indexer produced the hit.
    pub indexer_id: i64,
    /// Advertised size in bytes. Trackers may lie; advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}
