//! Torrent fixture builder.
//!
//! Emits real bencoded torrents so tests exercise the actual parse path;
//! the resulting info-hash is whatever the parser computes, so fixtures are
//! always self-consistent.

use crate::indexer::SnatchedTorrent;
use crate::model::{metafile_from_bytes, Metafile};

/// Builder for a valid `.torrent` byte blob.
pub struct TorrentFixture {
    name: String,
    files: Vec<(String, u64)>,
    single_length: Option<u64>,
    piece_length: u64,
    private: Option<bool>,
    trackers: Vec<String>,
}

/// A built fixture: the raw bytes and their parsed form.
pub struct BuiltTorrent {
    pub bytes: Vec<u8>,
    pub metafile: Metafile,
}

impl BuiltTorrent {
    pub fn snatched(&self) -> SnatchedTorrent {
        SnatchedTorrent {
            metafile: self.metafile.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

impl TorrentFixture {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            files: Vec::new(),
            single_length: None,
            piece_length: 16384,
            private: None,
            trackers: vec!["https://tracker.example/announce".to_string()],
        }
    }

    /// Add a file, path relative to the torrent root.
    pub fn file(mut self, path: &str, length: u64) -> Self {
        self.files.push((path.to_string(), length));
        self
    }

    /// Make this a single-file torrent of the given length.
    pub fn single_file(mut self, length: u64) -> Self {
        self.single_length = Some(length);
        self
    }

    pub fn piece_length(mut self, piece_length: u64) -> Self {
        self.piece_length = piece_length;
        self
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = Some(private);
        self
    }

    /// Replace the tracker list.
    pub fn trackers(mut self, urls: &[&str]) -> Self {
        self.trackers = urls.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn build(self) -> BuiltTorrent {
        let bytes = self.encode();
        let metafile = metafile_from_bytes(&bytes).expect("fixture must parse");
        BuiltTorrent { bytes, metafile }
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(b'd');

        if let Some(first) = self.trackers.first() {
            out.extend_from_slice(b"8:announce");
            push_bstr(&mut out, first);
        }
        if self.trackers.len() > 1 {
            out.extend_from_slice(b"13:announce-list");
            out.push(b'l');
            for tracker in &self.trackers {
                out.push(b'l');
                push_bstr(&mut out, tracker);
                out.push(b'e');
            }
            out.push(b'e');
        }

        out.extend_from_slice(b"4:info");
        out.push(b'd');

        let total: u64;
        if let Some(length) = self.single_length {
            total = length;
            out.extend_from_slice(b"6:length");
            push_int(&mut out, length);
        } else {
            total = self.files.iter().map(|(_, l)| l).sum();
            out.extend_from_slice(b"5:files");
            out.push(b'l');
            for (path, length) in &self.files {
                out.push(b'd');
                out.extend_from_slice(b"6:length");
                push_int(&mut out, *length);
                out.extend_from_slice(b"4:path");
                out.push(b'l');
                for part in path.split('/') {
                    push_bstr(&mut out, part);
                }
                out.push(b'e');
                out.push(b'e');
            }
            out.push(b'e');
        }

        out.extend_from_slice(b"4:name");
        push_bstr(&mut out, &self.name);
        out.extend_from_slice(b"12:piece length");
        push_int(&mut out, self.piece_length);

        let piece_count = total.div_ceil(self.piece_length).max(1);
        let pieces = b"01234567890123456789".repeat(piece_count as usize);
        out.extend_from_slice(format!("6:pieces{}:", pieces.len()).as_bytes());
        out.extend_from_slice(&pieces);

        if let Some(private) = self.private {
            out.extend_from_slice(b"7:private");
            push_int(&mut out, private as u64);
        }

        out.push(b'e');
        out.push(b'e');
        out
    }
}

fn push_bstr(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(format!("{}:", s.len()).as_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn push_int(out: &mut Vec<u8>, n: u64) {
    out.extend_from_slice(format!("i{}e", n).as_bytes());
}

/// Shorthand: a multi-file torrent's raw bytes.
pub fn torrent_bytes(name: &str, files: &[(&str, u64)]) -> Vec<u8> {
    let mut fixture = TorrentFixture::new(name);
    for (path, length) in files {
        fixture = fixture.file(path, *length);
    }
    fixture.build().bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_file_roundtrip() {
        let built = TorrentFixture::new("Show.S01")
            .file("Show.S01E01.mkv", 100)
            .file("Show.S01E02.mkv", 200)
            .private(true)
            .build();

        let meta = &built.metafile;
        assert_eq!(meta.name, "Show.S01");
        assert_eq!(meta.length, 300);
        assert_eq!(meta.files.len(), 2);
        assert_eq!(meta.files[0].path, "Show.S01/Show.S01E01.mkv");
        assert_eq!(meta.files[0].name, "Show.S01E01.mkv");
        assert_eq!(meta.private, Some(true));
        assert_eq!(meta.info_hash.len(), 40);
        assert_eq!(meta.tracker_hosts(), vec!["tracker.example"]);
    }

    #[test]
    fn test_single_file_roundtrip() {
        let built = TorrentFixture::new("album.flac").single_file(5000).build();
        assert_eq!(built.metafile.files.len(), 1);
        assert_eq!(built.metafile.files[0].path, "album.flac");
        assert_eq!(built.metafile.length, 5000);
        assert_eq!(built.metafile.private, None);
    }

    #[test]
    fn test_distinct_content_distinct_hashes() {
        let a = TorrentFixture::new("X").file("a", 100).build();
        let b = TorrentFixture::new("X").file("a", 101).build();
        assert_ne!(a.metafile.info_hash, b.metafile.info_hash);
    }

    #[test]
    fn test_multiple_trackers() {
        let built = TorrentFixture::new("X")
            .file("a", 100)
            .trackers(&[
                "https://one.example/announce",
                "https://two.example/announce",
            ])
            .build();
        assert_eq!(
            built.metafile.tracker_hosts(),
            vec!["one.example", "two.example"]
        );
    }
}
