//! The background scheduler.
//!
//! A [`Scheduler`] owns one [`TaskQueue`] and one dedicated thread that drains
//! it. It is the delivery engine for [`Channel`](crate::Channel) but accepts
//! arbitrary tasks as well.
//!
//! ```text
//!  submit(task, prio) ──► TaskQueue [High | Normal | Low] ──► scheduler thread ──► task()
//!                               ▲                                   │
//!  remove_task(id) ─────────────┘                      panics caught and logged
//! ```

use super::priority::{Priority, TaskQueue};
use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::executor::{PanicHandler, Task, TaskId};
use crate::telemetry::{Metrics, MetricsSnapshot};
use crate::util::thread::{join_thread, spawn_named};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Lifecycle state of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct Inner {
    queue: TaskQueue,
    running: AtomicBool,
    // Incremented by every successful `start`; a loop whose generation is
    // stale exits even if the flag was set again by a restart.
    generation: AtomicU64,
    config: SchedulerConfig,
    metrics: Metrics,
    panic_handler: PanicHandler,
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.running.load(Ordering::Acquire) && self.generation.load(Ordering::Acquire) == generation
    }

    fn run(&self, generation: u64) {
        log::debug!("{}: started", self.config.thread_name);

        while self.is_current(generation) {
            if let Some(task) = self.queue.pop_timeout(self.config.poll_interval) {
                self.execute(task);
            }
        }

        log::debug!("{}: stopped", self.config.thread_name);
    }

    fn execute(&self, task: Task) {
        let id = task.id();
        let queued = task.enqueued().elapsed();
        let start = Instant::now();

        log::trace!("{}: running {}", self.config.thread_name, id);
        if self.panic_handler.execute(|| task.execute()).is_err() {
            self.metrics.record_panic();
        }
        self.metrics.record_execution(queued, start.elapsed());
    }
}

/// Single-threaded, priority-aware background executor.
pub struct Scheduler {
    inner: Arc<Inner>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Creates a stopped scheduler. Call [`start`](Self::start) to spawn its
    /// thread.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;

        let queue = TaskQueue::new(config.queue_capacity)?;
        Ok(Self {
            inner: Arc::new(Inner {
                queue,
                running: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                config,
                metrics: Metrics::new(),
                panic_handler: PanicHandler::new("scheduler"),
            }),
            thread: Mutex::new(None),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(SchedulerConfig::default())
    }

    /// Starts the background thread. Idempotent: returns `Ok(false)` if the
    /// scheduler was already running.
    pub fn start(&self) -> Result<bool> {
        let mut slot = self.thread.lock();
        if self.inner.running.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let inner = Arc::clone(&self.inner);

        match spawn_named(
            &self.inner.config.thread_name,
            self.inner.config.stack_size,
            move || inner.run(generation),
        ) {
            Ok(handle) => {
                *slot = Some(handle);
                Ok(true)
            }
            Err(e) => {
                self.inner.running.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Stops the background thread and joins it. Tasks still queued are
    /// discarded. Idempotent: returns `false` if the scheduler was not
    /// running.
    pub fn shutdown(&self) -> bool {
        let handle = {
            let mut slot = self.thread.lock();
            if !self.inner.running.swap(false, Ordering::AcqRel) {
                return false;
            }
            slot.take()
        };

        // Joined outside the lock: a `start` racing in from here bumps the
        // generation, so the old loop still exits.
        self.inner.queue.notify();
        if let Some(handle) = handle {
            join_thread(handle, &self.inner.config.thread_name);
        }
        if self.is_running() {
            return true;
        }

        let discarded = self.inner.queue.clear();
        if discarded > 0 {
            self.inner.metrics.record_discarded(discarded);
            log::debug!(
                "{}: discarded {} queued task(s) at shutdown",
                self.inner.config.thread_name,
                discarded
            );
        }
        true
    }

    /// Queues `task` at `priority`.
    ///
    /// A stopped scheduler drops the task and returns `false`. A full queue
    /// blocks the caller for up to the configured `submit_timeout`; the task
    /// is dropped if no slot frees up in time.
    pub fn submit(&self, task: Task, priority: Priority) -> bool {
        if !self.inner.running.load(Ordering::Acquire) {
            log::debug!(
                "{}: not running, dropping {}",
                self.inner.config.thread_name,
                task.id()
            );
            self.inner.metrics.record_rejected();
            return false;
        }

        match self
            .inner
            .queue
            .push_timeout(task, priority, self.inner.config.submit_timeout)
        {
            Ok(()) => {
                self.inner.metrics.record_submitted();
                true
            }
            Err(task) => {
                log::warn!(
                    "{}: queue full, dropping {}",
                    self.inner.config.thread_name,
                    task.id()
                );
                self.inner.metrics.record_rejected();
                false
            }
        }
    }

    /// Wraps `f` in a [`Task`] and submits it, returning its id if queued.
    pub fn execute<F>(&self, f: F, priority: Priority) -> Option<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        let task = Task::new(f);
        let id = task.id();
        self.submit(task, priority).then_some(id)
    }

    /// Cancels a task that has not started yet. Has no effect on a task that
    /// is already running or finished.
    pub fn remove_task(&self, id: TaskId) -> bool {
        let removed = self.inner.queue.remove(id);
        if removed {
            self.inner.metrics.record_cancelled();
        }
        removed
    }

    /// Blocks until the queue is empty or `timeout` passes. Returns at once
    /// when the scheduler is not running.
    ///
    /// The last dequeued task may still be executing when this returns.
    pub fn wait(&self, timeout: Duration) -> bool {
        if !self.is_running() {
            return true;
        }
        self.inner.queue.wait(timeout)
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SchedulerState {
        if self.is_running() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    pub fn queue_len_at(&self, priority: Priority) -> usize {
        self.inner.queue.len_at(priority)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.inner.config.thread_name)
            .field("state", &self.state())
            .field("queue", &self.inner.queue)
            .finish()
    }
}
