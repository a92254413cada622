//! Shared run counters and the optional periodic progress reporter

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Counters updated by the collector and read by the reporter task
#[derive(Debug)]
pub struct ProgressCounters {
    pub accepted: AtomicU64,
    pub rejected: AtomicU64,
    pub errors: AtomicU64,
    pub skipped: AtomicU64,

    /// Times the collector paused for the API quota
    pub throttled: AtomicU64,

    /// Cumulative accepted count including earlier runs
    pub cumulative: AtomicU64,

    started: Instant,
}

/// Point-in-time copy of [`ProgressCounters`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub errors: u64,
    pub skipped: u64,
    pub throttled: u64,
    pub cumulative: u64,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Accepted records per hour
    pub fn rate_per_hour(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.accepted as f64 * 3600.0 / secs
    }
}

impl ProgressCounters {
    pub fn new(cumulative: u64) -> Self {
        Self {
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            throttled: AtomicU64::new(0),
            cumulative: AtomicU64::new(cumulative),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            cumulative: self.cumulative.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
        }
    }
}

/// Spawns a task that logs progress every `interval`
///
/// Returns `None` when `interval` is zero. The task runs until aborted.
pub fn spawn_reporter(
    counters: Arc<ProgressCounters>,
    interval: Duration,
    target: u64,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snap = counters.snapshot();
            tracing::info!(
                collected = snap.cumulative,
                target,
                new_this_run = snap.accepted,
                rejected = snap.rejected,
                errors = snap.errors,
                throttled = snap.throttled,
                rate_per_hour = format!("{:.1}", snap.rate_per_hour()),
                "Collection progress"
            );
        }
    }))
}
