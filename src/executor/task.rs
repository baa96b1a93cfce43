//! Task representation and execution.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task, used to cancel it while it is still queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Priority tier. Higher tiers are always dequeued before lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
}

impl Priority {
    /// Number of priority tiers.
    pub const COUNT: usize = 3;

    /// Tiers in the order they are drained.
    pub const DESCENDING: [Priority; Priority::COUNT] =
        [Priority::High, Priority::Normal, Priority::Low];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A move-only, zero-argument unit of deferred work.
pub struct Task {
    id: TaskId,
    func: Box<dyn FnOnce() + Send + 'static>,
    created: Instant,
    enqueued: Instant,
}

impl Task {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let now = Instant::now();
        Task {
            id: TaskId::next(),
            func: Box::new(f),
            created: now,
            enqueued: now,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn created(&self) -> Instant {
        self.created
    }

    /// When the task last entered a queue. Equal to [`created`](Self::created)
    /// until then.
    pub fn enqueued(&self) -> Instant {
        self.enqueued
    }

    pub(crate) fn mark_enqueued(&mut self) {
        self.enqueued = Instant::now();
    }

    /// Runs the task, consuming it.
    pub fn execute(self) {
        (self.func)();
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("created", &self.created)
            .finish()
    }
}
