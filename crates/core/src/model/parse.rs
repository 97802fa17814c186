//! Metafile parser - builds a [`Metafile`] from raw `.torrent` bytes.
//!
//! Uses librqbit-core to parse the bencoded data. Supports both single-file
//! and multi-file torrents.

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};
use thiserror::Error;

use super::types::{FileEntry, Metafile};

/// Errors that can occur when parsing a `.torrent` file.
#[derive(Debug, Error)]
pub enum MetafileParseError {
    #[error("Failed to parse torrent: {0}")]
    ParseError(String),

    #[error("Empty torrent (no files)")]
    EmptyTorrent,
}

/// Parse raw `.torrent` bytes into a [`Metafile`].
pub fn metafile_from_bytes(bytes: &[u8]) -> Result<Metafile, MetafileParseError> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| MetafileParseError::ParseError(e.to_string()))?;

    let info = &torrent.info;

    // Root name (folder name for multi-file, file name for single-file).
    let root_name = info
        .name
        .as_ref()
        .map(|b| bytes_to_string(b.as_ref()))
        .unwrap_or_else(|| "unknown".to_string());

    let files = if let Some(ref files) = info.files {
        // Multi-file torrent: paths are root_name/path/components.
        let mut result = Vec::with_capacity(files.len());
        for file in files {
            let mut path_parts = vec![root_name.clone()];
            for part in &file.path {
                path_parts.push(bytes_to_string(part.as_ref()));
            }
            result.push(FileEntry::from_path(path_parts.join("/"), file.length));
        }
        if result.is_empty() {
            return Err(MetafileParseError::EmptyTorrent);
        }
        result
    } else if let Some(length) = info.length {
        vec![FileEntry::from_path(root_name.clone(), length)]
    } else {
        return Err(MetafileParseError::EmptyTorrent);
    };

    let length = files.iter().map(|f| f.length).sum();

    // Announce list flattened in tier order, falling back to the single
    // announce URL when no list is present.
    let mut trackers: Vec<String> = torrent
        .announce_list
        .iter()
        .flatten()
        .map(|b| bytes_to_string(b.as_ref()))
        .collect();
    if trackers.is_empty() {
        if let Some(ref announce) = torrent.announce {
            trackers.push(bytes_to_string(announce.as_ref()));
        }
    }

    Ok(Metafile {
        info_hash: torrent.info_hash.as_string(),
        name: root_name,
        length,
        piece_length: u64::from(info.piece_length),
        files,
        trackers,
        private: parse_private_flag(bytes),
    })
}

/// Extract the info dict `private` flag as a tri-state.
///
/// Best-effort token scan over the bencoded bytes; returns `None` when the
/// key is absent, which callers must treat as "unknown" rather than false.
fn parse_private_flag(bytes: &[u8]) -> Option<bool> {
    if contains(bytes, b"7:privatei1e") {
        Some(true)
    } else if contains(bytes, b"7:privatei0e") {
        Some(false)
    } else {
        None
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Convert bytes to a UTF-8 string, tolerating invalid sequences.
fn bytes_to_string(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_invalid_torrent() {
        let result = metafile_from_bytes(b"not a valid torrent");
        assert!(matches!(result, Err(MetafileParseError::ParseError(_))));
    }

    #[test]
    fn test_parse_empty_data() {
        assert!(metafile_from_bytes(b"").is_err());
    }

    #[test]
    fn test_private_flag_scan() {
        assert_eq!(parse_private_flag(b"d4:infod7:privatei1eee"), Some(true));
        assert_eq!(parse_private_flag(b"d4:infod7:privatei0eee"), Some(false));
        assert_eq!(parse_private_flag(b"d4:infodee"), None);
    }

    #[test]
    fn test_bytes_to_string_valid_utf8() {
        assert_eq!(bytes_to_string(b"hello.mkv"), "hello.mkv");
    }

    #[test]
    fn test_bytes_to_string_invalid_utf8() {
        let s = bytes_to_string(&[0x66, 0x6f, 0xff, 0x6f]);
        assert!(s.starts_with("fo"));
    }
}
