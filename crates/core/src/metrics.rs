//! Prometheus metrics for core components.
//!
//! This module provides counters for:
//! - Decision engine (assessments by decision tag, snatch outcomes)
//! - Conflict resolution (evictions, recorded collisions)
//! - Scheduler (job runs by name and result)

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

/// Assessments total by decision tag.
pub static DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reseed_decisions_total", "Total candidate assessments"),
        &["decision"],
    )
    .unwrap()
});

/// Snatch attempts total by outcome.
pub static SNATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reseed_snatches_total", "Total snatch attempts"),
        &["result"], // "ok", "magnet", "rate_limited", "failed"
    )
    .unwrap()
});

/// Incumbent evictions that completed across all clients.
pub static EVICTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("reseed_evictions_total", "Total incumbent evictions").unwrap()
});

/// Collision rows written.
pub static COLLISIONS_RECORDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reseed_collisions_recorded_total",
        "Total collision rows written",
    )
    .unwrap()
});

/// Job executions by name and result.
pub static JOB_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reseed_job_runs_total", "Total scheduled job executions"),
        &["job", "result"], // result: "ok", "error"
    )
    .unwrap()
});

/// Register all core metrics with the given registry.
pub fn register_core_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(DECISIONS_TOTAL.clone()))?;
    registry.register(Box::new(SNATCHES_TOTAL.clone()))?;
    registry.register(Box::new(EVICTIONS_TOTAL.clone()))?;
    registry.register(Box::new(COLLISIONS_RECORDED_TOTAL.clone()))?;
    registry.register(Box::new(JOB_RUNS_TOTAL.clone()))?;
    Ok(())
}
