//! The cooperative job scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::metrics;
use crate::store::JobLogStore;

use super::types::{Job, JobConfigOverride, JobError, JobName};

/// Process-long scheduler. Jobs are registered once at startup; the tick
/// loop then launches eligible jobs asynchronously under the exclusion
/// rules.
pub struct JobScheduler {
    jobs: Vec<Job>,
    job_log: JobLogStore,
    tick_interval: Duration,
    /// Serializes whole ticks (the CHECK_JOBS mutex).
    check_mutex: Mutex<()>,
    running: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl JobScheduler {
    pub fn new(job_log: JobLogStore, tick_interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            jobs: Vec::new(),
            job_log,
            tick_interval,
            check_mutex: Mutex::new(()),
            running: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Register a job. Call before [`start`].
    pub fn register(&mut self, job: Job) {
        debug!(job = %job.name, cadence_ms = job.cadence.as_millis() as u64, "Registered job");
        self.jobs.push(job);
    }

    pub fn job(&self, name: JobName) -> Option<&Job> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Request a run on the next tick regardless of cadence.
    pub fn run_ahead_of_schedule(&self, name: JobName, config_override: Option<JobConfigOverride>) {
        if let Some(job) = self.job(name) {
            if let Some(o) = config_override {
                *job.state.config_override.lock().unwrap_or_else(|e| e.into_inner()) = Some(o);
            }
            job.state.run_ahead_of_schedule.store(true, Ordering::SeqCst);
        }
    }

    /// Push the next eligible run one cadence further out.
    pub fn delay_next_run(&self, name: JobName) {
        if let Some(job) = self.job(name) {
            job.state.delay_next_run.store(true, Ordering::SeqCst);
        }
    }

    /// Start the tick loop (spawns a background task).
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }
        info!("Starting job scheduler");

        let scheduler = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(scheduler.tick_interval) => {
                        if !scheduler.running.load(Ordering::Relaxed) {
                            break;
                        }
                        scheduler.check_jobs().await;
                    }
                }
            }
            info!("Scheduler stopped");
        });
    }

    /// Stop the tick loop. In-flight jobs run to completion.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
    }

    /// One scheduling tick. Serialized; safe to call concurrently with the
    /// background loop (e.g. from an operator-triggered run).
    pub async fn check_jobs(&self) {
        let _guard = self.check_mutex.lock().await;
        let now = Utc::now();

        // An active RSS scan freezes the whole tick.
        if self
            .jobs
            .iter()
            .any(|j| j.name == JobName::Rss && j.is_active())
        {
            debug!("RSS active, skipping tick");
            return;
        }

        for job in &self.jobs {
            if !job.should_run() {
                continue;
            }

            if job.name.defers_to_active_jobs()
                && self.jobs.iter().any(|j| j.name != job.name && j.is_active())
            {
                debug!(job = %job.name, "Deferring to active job");
                continue;
            }

            let ahead = job.state.run_ahead_of_schedule.load(Ordering::SeqCst);
            let eligible = ahead
                || match self.job_log.last_run(job.name.as_str()) {
                    Ok(Some(last_run)) => {
                        let due = last_run
                            + chrono::Duration::milliseconds(job.cadence.as_millis() as i64);
                        now >= due
                    }
                    Ok(None) => true,
                    Err(e) => {
                        warn!(job = %job.name, error = %e, "Could not read last run");
                        false
                    }
                };
            if !eligible {
                continue;
            }

            self.launch(job);
        }
    }

    /// Launch one job asynchronously. Returns whether it actually started.
    fn launch(&self, job: &Job) -> bool {
        // At-most-one-in-flight per job.
        if job.state.is_active.swap(true, Ordering::SeqCst) {
            return false;
        }

        let name = job.name;
        let cadence = job.cadence;
        let state = Arc::clone(&job.state);
        let executor = Arc::clone(&job.executor);
        let job_log = self.job_log.clone();

        tokio::spawn(async move {
            let config_override = state
                .config_override
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone();

            debug!(job = %name, "Job starting");
            let result = executor.run(config_override).await;

            match result {
                Ok(()) => {
                    metrics::JOB_RUNS_TOTAL
                        .with_label_values(&[name.as_str(), "ok"])
                        .inc();
                    let mut last_run = Utc::now();
                    if state.delay_next_run.swap(false, Ordering::SeqCst) {
                        // Persisting now + cadence doubles the effective
                        // interval exactly once.
                        last_run += chrono::Duration::milliseconds(cadence.as_millis() as i64);
                    }
                    if let Err(e) = job_log.set_last_run(name.as_str(), last_run) {
                        warn!(job = %name, error = %e, "Could not persist last run");
                    } else {
                        let next = last_run
                            + chrono::Duration::milliseconds(cadence.as_millis() as i64);
                        info!(job = %name, next_run = %next.to_rfc3339(), "Job finished");
                    }
                }
                Err(JobError::Fatal(msg)) => {
                    error!(job = %name, error = %msg, "Fatal job error, terminating");
                    std::process::exit(1);
                }
                Err(e) => {
                    metrics::JOB_RUNS_TOTAL
                        .with_label_values(&[name.as_str(), "error"])
                        .inc();
                    warn!(job = %name, error = %e, "Job failed");
                }
            }

            // Cleared unconditionally after every run.
            state.run_ahead_of_schedule.store(false, Ordering::SeqCst);
            *state
                .config_override
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = None;
            state.is_active.store(false, Ordering::SeqCst);
        });

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct CountingExecutor {
        runs: Arc<AtomicUsize>,
        block: Option<Arc<tokio::sync::Notify>>,
    }

    #[async_trait]
    impl super::super::JobExecutor for CountingExecutor {
        async fn run(&self, _o: Option<JobConfigOverride>) -> Result<(), JobError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.block {
                gate.notified().await;
            }
            Ok(())
        }
    }

    fn counting_job(
        name: JobName,
        cadence: Duration,
        block: Option<Arc<tokio::sync::Notify>>,
    ) -> (Job, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let job = Job::new(
            name,
            cadence,
            Arc::new(CountingExecutor {
                runs: Arc::clone(&runs),
                block,
            }),
        );
        (job, runs)
    }

    fn scheduler() -> JobScheduler {
        JobScheduler::new(
            JobLogStore::new(Database::in_memory().unwrap()),
            Duration::from_secs(60),
        )
    }

    async fn settle() {
        // Let spawned job tasks run.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_job_runs_and_persists_last_run() {
        let mut s = scheduler();
        let (job, runs) = counting_job(JobName::Cleanup, Duration::from_secs(3600), None);
        s.register(job);

        s.check_jobs().await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(s.job_log.last_run("CLEANUP").unwrap().is_some());

        // Within cadence: not eligible again.
        s.check_jobs().await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_ahead_of_schedule() {
        let mut s = scheduler();
        let (job, runs) = counting_job(JobName::Search, Duration::from_secs(3600), None);
        s.register(job);

        s.check_jobs().await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        s.run_ahead_of_schedule(JobName::Search, None);
        s.check_jobs().await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rss_active_skips_entire_tick() {
        let mut s = scheduler();
        let gate = Arc::new(tokio::sync::Notify::new());
        let (rss, rss_runs) = counting_job(JobName::Rss, Duration::from_secs(3600), Some(gate.clone()));
        let (other, other_runs) = counting_job(JobName::Search, Duration::from_secs(3600), None);
        s.register(rss);
        s.register(other);

        // Launch RSS only: it parks on the gate and stays active.
        s.job(JobName::Rss).unwrap().state.run_ahead_of_schedule.store(true, Ordering::SeqCst);
        let rss_job = s.job(JobName::Rss).unwrap();
        s.launch(rss_job);
        settle().await;
        assert_eq!(rss_runs.load(Ordering::SeqCst), 1);
        assert!(s.job(JobName::Rss).unwrap().is_active());

        // Tick while RSS is active: nothing else launches.
        s.check_jobs().await;
        settle().await;
        assert_eq!(other_runs.load(Ordering::SeqCst), 0);

        gate.notify_waiters();
        settle().await;
        s.check_jobs().await;
        settle().await;
        assert_eq!(other_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_housekeeping_defers_to_active_jobs() {
        let mut s = scheduler();
        let gate = Arc::new(tokio::sync::Notify::new());
        let (search, _search_runs) =
            counting_job(JobName::Search, Duration::from_secs(3600), Some(gate.clone()));
        let (cleanup, cleanup_runs) = counting_job(JobName::Cleanup, Duration::from_secs(3600), None);
        s.register(search);
        s.register(cleanup);

        let search_job = s.job(JobName::Search).unwrap();
        s.launch(search_job);
        settle().await;
        assert!(s.job(JobName::Search).unwrap().is_active());

        s.check_jobs().await;
        settle().await;
        assert_eq!(cleanup_runs.load(Ordering::SeqCst), 0);

        gate.notify_waiters();
        settle().await;
        s.check_jobs().await;
        settle().await;
        assert_eq!(cleanup_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_at_most_one_in_flight() {
        let mut s = scheduler();
        let gate = Arc::new(tokio::sync::Notify::new());
        let (job, runs) = counting_job(JobName::Inject, Duration::from_secs(3600), Some(gate.clone()));
        s.register(job);

        let job_ref = s.job(JobName::Inject).unwrap();
        assert!(s.launch(job_ref));
        settle().await;
        // Second launch while the first is parked: refused.
        let job_ref = s.job(JobName::Inject).unwrap();
        assert!(!s.launch(job_ref));
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        gate.notify_waiters();
        settle().await;
    }

    #[tokio::test]
    async fn test_should_run_predicate_gates_job() {
        let mut s = scheduler();
        let runs = Arc::new(AtomicUsize::new(0));
        let job = Job::new(
            JobName::Inject,
            Duration::from_secs(3600),
            Arc::new(CountingExecutor {
                runs: Arc::clone(&runs),
                block: None,
            }),
        )
        .with_should_run(|| false);
        s.register(job);

        s.check_jobs().await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delay_next_run_pushes_last_run_forward() {
        let mut s = scheduler();
        let (job, _runs) = counting_job(JobName::Search, Duration::from_secs(3600), None);
        s.register(job);
        s.delay_next_run(JobName::Search);

        s.check_jobs().await;
        settle().await;

        let last_run = s.job_log.last_run("SEARCH").unwrap().unwrap();
        // Persisted roughly one cadence in the future.
        assert!(last_run > Utc::now() + chrono::Duration::minutes(30));
    }
}
