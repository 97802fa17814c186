//! Value types shared across the engine.
//!
//! A [`Searchee`] is content we already seed locally, a [`Candidate`] is an
//! indexer search hit under evaluation, and a [`Metafile`] is a parsed
//! `.torrent`. All three are plain data; parsing lives in [`parse`] and
//! tracker-set normalization in [`tracker`].

mod parse;
mod tracker;
mod types;

pub use parse::{metafile_from_bytes, MetafileParseError};
pub use tracker::{normalize_tracker, normalize_tracker_set, tracker_host, tracker_sets_equal};
pub use types::{Candidate, FileEntry, Metafile, Searchee, SearcheeLabel};
