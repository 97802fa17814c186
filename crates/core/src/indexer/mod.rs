//! Indexer-side collaborators: snatching and bulk search dispatch.
//!
//! The torznab search protocol itself lives outside this crate; what the
//! engine needs is the ability to fetch a candidate's `.torrent` (snatch)
//! and to kick off bulk searches by searchee name.

mod http;
mod types;

pub use http::HttpSnatcher;
pub use types::{
    BulkSearchOptions, BulkSearchSummary, BulkSearcher, SearchDispatchError, SnatchError,
    SnatchedTorrent, Snatcher,
};
