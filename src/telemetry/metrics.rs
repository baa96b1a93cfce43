//! Counters for task flow through a scheduler or worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free counters updated by the submitting threads and the executing
/// thread.
#[derive(Debug)]
pub struct Metrics {
    // Admission
    tasks_submitted: AtomicU64,
    tasks_rejected: AtomicU64,

    // Outcome
    tasks_executed: AtomicU64,
    tasks_panicked: AtomicU64,
    tasks_cancelled: AtomicU64,
    tasks_discarded: AtomicU64,

    busy_time_ns: AtomicU64,
    queue_wait_ns: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tasks_submitted: AtomicU64::new(0),
            tasks_rejected: AtomicU64::new(0),
            tasks_executed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            tasks_cancelled: AtomicU64::new(0),
            tasks_discarded: AtomicU64::new(0),
            busy_time_ns: AtomicU64::new(0),
            queue_wait_ns: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// A task was refused: target stopped, or no room before the timeout.
    pub fn record_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished task with how long it waited and how long it ran.
    pub fn record_execution(&self, queued: Duration, busy: Duration) {
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);
        self.queue_wait_ns
            .fetch_add(queued.as_nanos() as u64, Ordering::Relaxed);
        self.busy_time_ns
            .fetch_add(busy.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_panic(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.tasks_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Queued tasks thrown away by a shutdown.
    pub fn record_discarded(&self, count: usize) {
        self.tasks_discarded
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Instant::now(),
            uptime: self.start_time.elapsed(),
            tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
            tasks_rejected: self.tasks_rejected.load(Ordering::Relaxed),
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            tasks_cancelled: self.tasks_cancelled.load(Ordering::Relaxed),
            tasks_discarded: self.tasks_discarded.load(Ordering::Relaxed),
            busy_time_ns: self.busy_time_ns.load(Ordering::Relaxed),
            queue_wait_ns: self.queue_wait_ns.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.tasks_submitted.store(0, Ordering::Relaxed);
        self.tasks_rejected.store(0, Ordering::Relaxed);
        self.tasks_executed.store(0, Ordering::Relaxed);
        self.tasks_panicked.store(0, Ordering::Relaxed);
        self.tasks_cancelled.store(0, Ordering::Relaxed);
        self.tasks_discarded.store(0, Ordering::Relaxed);
        self.busy_time_ns.store(0, Ordering::Relaxed);
        self.queue_wait_ns.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub timestamp: Instant,
    pub uptime: Duration,
    pub tasks_submitted: u64,
    pub tasks_rejected: u64,
    pub tasks_executed: u64,
    pub tasks_panicked: u64,
    pub tasks_cancelled: u64,
    pub tasks_discarded: u64,
    pub busy_time_ns: u64,
    pub queue_wait_ns: u64,
}

impl MetricsSnapshot {
    /// Mean run time of executed tasks (panicked ones included).
    pub fn avg_task_time(&self) -> Duration {
        if self.tasks_executed == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.busy_time_ns / self.tasks_executed)
    }

    /// Mean time a task spent queued before it started.
    pub fn avg_queue_wait(&self) -> Duration {
        if self.tasks_executed == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.queue_wait_ns / self.tasks_executed)
    }

    /// Fraction of uptime spent running tasks (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        let uptime_ns = self.uptime.as_nanos() as f64;
        if uptime_ns == 0.0 {
            return 0.0;
        }
        (self.busy_time_ns as f64 / uptime_ns).min(1.0)
    }
}
