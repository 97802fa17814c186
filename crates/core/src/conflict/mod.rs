//! Conflict handling between same-info-hash seeds on different trackers.
//!
//! When a candidate's info-hash already exists locally under another
//! tracker, operator-defined priority rules decide whether the incumbent
//! copy is evicted in favor of the newcomer ([`resolver`]) and whether the
//! collision is persisted for later review ([`recorder`]).

mod recorder;
mod resolver;

pub use recorder::collision_payload;
pub use resolver::ConflictResolver;
