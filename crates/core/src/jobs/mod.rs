//! Recurring job scheduling.
//!
//! Jobs are registered at startup and driven by a cooperative tick loop
//! with mutual exclusion: at most one run per job in flight, a tick-wide
//! skip while RSS is active, and housekeeping jobs deferring to everything
//! else.

mod cleanup;
mod recheck;
mod scheduler;
mod types;

pub use cleanup::CleanupJob;
pub use recheck::CollisionRecheckJob;
pub use scheduler::JobScheduler;
pub use types::{Job, JobConfigOverride, JobError, JobExecutor, JobName};

use std::time::Duration;

/// Default cadences.
pub const UPDATE_INDEXER_CAPS_CADENCE: Duration = Duration::from_secs(24 * 60 * 60);
pub const INJECT_CADENCE: Duration = Duration::from_secs(60 * 60);
pub const CLEANUP_CADENCE: Duration = Duration::from_secs(24 * 60 * 60);
pub const COLLISION_RECHECK_CADENCE: Duration = Duration::from_secs(60 * 60);
