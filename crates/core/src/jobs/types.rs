//! Job identities, executors and per-job runtime state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed set of schedulable jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobName {
    Rss,
    Search,
    UpdateIndexerCaps,
    Inject,
    Cleanup,
    CollisionRecheck,
}

impl JobName {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobName::Rss => "RSS",
            JobName::Search => "SEARCH",
            JobName::UpdateIndexerCaps => "UPDATE_INDEXER_CAPS",
            JobName::Inject => "INJECT",
            JobName::Cleanup => "CLEANUP",
            JobName::CollisionRecheck => "COLLISION_RECHECK",
        }
    }

    /// Housekeeping jobs defer to any other active job.
    pub fn defers_to_active_jobs(&self) -> bool {
        matches!(self, JobName::Cleanup | JobName::CollisionRecheck)
    }
}

impl std::fmt::Display for JobName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by job executors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Logged and swallowed by the scheduler.
    #[error("Job failed: {0}")]
    Failed(String),

    /// Terminates the process.
    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl From<crate::store::StoreError> for JobError {
    fn from(e: crate::store::StoreError) -> Self {
        JobError::Failed(e.to_string())
    }
}

/// Per-run configuration override, cleared after every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfigOverride {
    /// Force searches even for recently searched names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_recent_search: Option<bool>,
}

/// The work a job performs on each run.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn run(&self, config_override: Option<JobConfigOverride>) -> Result<(), JobError>;
}

/// Mutable per-job flags shared between the tick loop and running tasks.
#[derive(Default)]
pub(crate) struct JobState {
    pub is_active: AtomicBool,
    pub run_ahead_of_schedule: AtomicBool,
    pub delay_next_run: AtomicBool,
    pub config_override: Mutex<Option<JobConfigOverride>>,
}

/// A registered job.
pub struct Job {
    pub name: JobName,
    pub cadence: Duration,
    pub(crate) executor: Arc<dyn JobExecutor>,
    pub(crate) should_run: Option<Box<dyn Fn() -> bool + Send + Sync>>,
    pub(crate) state: Arc<JobState>,
}

impl Job {
    pub fn new(name: JobName, cadence: Duration, executor: Arc<dyn JobExecutor>) -> Self {
        Self {
            name,
            cadence,
            executor,
            should_run: None,
            state: Arc::new(JobState::default()),
        }
    }

    /// Attach a predicate consulted on every tick; a false result skips the
    /// job entirely.
    pub fn with_should_run(mut self, predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.should_run = Some(Box::new(predicate));
        self
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active.load(Ordering::SeqCst)
    }

    pub(crate) fn should_run(&self) -> bool {
        self.should_run.as_ref().map(|p| p()).unwrap_or(true)
    }
}
