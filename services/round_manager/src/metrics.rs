//! Orchestrator metrics collection

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Point-in-time copy of the orchestrator counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub ticks_overlapped: u64,
    pub tick_failures: u64,
    pub freezes: u64,
    pub snapshots_submitted: u64,
    pub empty_freezes: u64,
    pub safety_aborts: u64,
    pub submission_failures: u64,
    pub recoveries: u64,
    pub reconcile_failures: u64,
    pub rounds_created: u64,
    pub lock_contentions: u64,
}

/// Thread-safe counters shared by the orchestrator and its coordinators
#[derive(Debug)]
pub struct OrchestratorMetrics {
    start_time: Instant,
    ticks: AtomicU64,
    ticks_overlapped: AtomicU64,
    tick_failures: AtomicU64,
    freezes: AtomicU64,
    snapshots_submitted: AtomicU64,
    empty_freezes: AtomicU64,
    safety_aborts: AtomicU64,
    submission_failures: AtomicU64,
    recoveries: AtomicU64,
    reconcile_failures: AtomicU64,
    rounds_created: AtomicU64,
    lock_contentions: AtomicU64,
}

impl OrchestratorMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            ticks: AtomicU64::new(0),
            ticks_overlapped: AtomicU64::new(0),
            tick_failures: AtomicU64::new(0),
            freezes: AtomicU64::new(0),
            snapshots_submitted: AtomicU64::new(0),
            empty_freezes: AtomicU64::new(0),
            safety_aborts: AtomicU64::new(0),
            submission_failures: AtomicU64::new(0),
            recoveries: AtomicU64::new(0),
            reconcile_failures: AtomicU64::new(0),
            rounds_created: AtomicU64::new(0),
            lock_contentions: AtomicU64::new(0),
        }
    }

    pub fn increment_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_ticks_overlapped(&self) {
        self.ticks_overlapped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_tick_failures(&self) {
        self.tick_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_freezes(&self) {
        self.freezes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_snapshots_submitted(&self) {
        self.snapshots_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_empty_freezes(&self) {
        self.empty_freezes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_safety_aborts(&self) {
        self.safety_aborts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_submission_failures(&self) {
        self.submission_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_recoveries(&self) {
        self.recoveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reconcile_failures(&self) {
        self.reconcile_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rounds_created(&self) {
        self.rounds_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_lock_contentions(&self) {
        self.lock_contentions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            ticks_overlapped: self.ticks_overlapped.load(Ordering::Relaxed),
            tick_failures: self.tick_failures.load(Ordering::Relaxed),
            freezes: self.freezes.load(Ordering::Relaxed),
            snapshots_submitted: self.snapshots_submitted.load(Ordering::Relaxed),
            empty_freezes: self.empty_freezes.load(Ordering::Relaxed),
            safety_aborts: self.safety_aborts.load(Ordering::Relaxed),
            submission_failures: self.submission_failures.load(Ordering::Relaxed),
            recoveries: self.recoveries.load(Ordering::Relaxed),
            reconcile_failures: self.reconcile_failures.load(Ordering::Relaxed),
            rounds_created: self.rounds_created.load(Ordering::Relaxed),
            lock_contentions: self.lock_contentions.load(Ordering::Relaxed),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for OrchestratorMetrics {
    fn default() -> Self {
        Self::new()
    }
}
