//! Content-addressed torrent cache.
//!
//! Snatched torrents are kept on disk under `<app_dir>/torrents/` as
//! `{info_hash}.cached.torrent`, holding the original bencoded bytes.
//! Writes are best-effort; readers tolerate missing files. A corrupt entry
//! is deleted and treated as a miss.

mod guid_map;

pub use guid_map::GuidInfoHashMap;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{metafile_from_bytes, Metafile};

const CACHE_SUFFIX: &str = ".cached.torrent";

/// Errors from the torrent cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk cache keyed by info-hash.
#[derive(Clone)]
pub struct TorrentCache {
    dir: PathBuf,
}

impl TorrentCache {
    /// Create the cache under `<app_dir>/torrents/`.
    pub fn new(app_dir: &Path) -> Result<Self, CacheError> {
        let dir = app_dir.join("torrents");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, info_hash: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}", info_hash.to_lowercase(), CACHE_SUFFIX))
    }

    /// Store the original bencoded bytes for an info-hash.
    pub fn store(&self, info_hash: &str, bytes: &[u8]) -> Result<(), CacheError> {
        fs::write(self.path_for(info_hash), bytes)?;
        Ok(())
    }

    /// Load and parse a cached torrent, touching its mtime.
    ///
    /// A corrupt file is removed best-effort; a failing unlink is only
    /// logged so it never hides the parse failure itself. Either way the
    /// entry counts as a miss.
    pub fn load(&self, info_hash: &str) -> Result<Option<Metafile>, CacheError> {
        let path = self.path_for(info_hash);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match metafile_from_bytes(&bytes) {
            Ok(meta) => {
                touch(&path);
                Ok(Some(meta))
            }
            Err(e) => {
                warn!(info_hash = info_hash, error = %e, "Corrupt cached torrent, discarding");
                if let Err(unlink_err) = fs::remove_file(&path) {
                    if path.exists() {
                        warn!(path = %path.display(), error = %unlink_err, "Failed to remove corrupt cache entry");
                    }
                }
                Ok(None)
            }
        }
    }

    pub fn contains(&self, info_hash: &str) -> bool {
        self.path_for(info_hash).exists()
    }

    /// Remove a cache entry.
    pub fn remove(&self, info_hash: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path_for(info_hash)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Info-hashes of every cached file, for the cleanup sweep.
    pub fn list_hashes(&self) -> Result<Vec<String>, CacheError> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(hash) = name.strip_suffix(CACHE_SUFFIX) {
                out.push(hash.to_string());
            }
        }
        Ok(out)
    }
}

fn touch(path: &Path) {
    let Ok(file) = fs::File::options().write(true).open(path) else {
        return;
    };
    if let Err(e) = file.set_modified(SystemTime::now()) {
        debug!(path = %path.display(), error = %e, "Failed to touch cache entry");
    }
}
