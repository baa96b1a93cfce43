//! Priority-ordered task queue.
//!
//! [`TaskQueue`] keeps one FIFO lane per [`Priority`] and always serves the
//! highest non-empty lane first. The total number of resident tasks is bounded
//! and producers block (up to a timeout) on a full queue, exactly like
//! [`BoundedQueue`](crate::util::BoundedQueue): both sit on the same blocking
//! core and differ only in how tasks are stored.

use crate::error::Result;
use crate::executor::{Task, TaskId};
use crate::util::queue_core::{QueueCore, Storage};
use crate::util::sync::deadline_after;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

pub use crate::executor::Priority;

#[derive(Default)]
struct Lanes {
    lanes: [VecDeque<Task>; Priority::COUNT],
    len: usize,
}

impl Lanes {
    fn remove(&mut self, id: TaskId) -> Option<Task> {
        for lane in self.lanes.iter_mut() {
            if let Some(pos) = lane.iter().position(|task| task.id() == id) {
                let task = lane.remove(pos)?;
                self.len -= 1;
                return Some(task);
            }
        }
        None
    }

    fn contains(&self, id: TaskId) -> bool {
        self.lanes
            .iter()
            .any(|lane| lane.iter().any(|task| task.id() == id))
    }
}

impl Storage for Lanes {
    type Item = Task;
    type Slot = Priority;

    fn len(&self) -> usize {
        self.len
    }

    fn push(&mut self, mut task: Task, priority: Priority) {
        task.mark_enqueued();
        self.lanes[priority.index()].push_back(task);
        self.len += 1;
    }

    fn pop(&mut self) -> Option<Task> {
        for priority in Priority::DESCENDING {
            if let Some(task) = self.lanes[priority.index()].pop_front() {
                self.len -= 1;
                return Some(task);
            }
        }
        None
    }

    fn drain(&mut self) -> Vec<Task> {
        self.len = 0;
        self.lanes.iter_mut().flat_map(|lane| lane.drain(..)).collect()
    }
}

pub struct TaskQueue {
    core: QueueCore<Lanes>,
}

impl TaskQueue {
    /// Creates a queue holding at most `capacity` tasks across all lanes.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            core: QueueCore::new(Lanes::default(), capacity)?,
        })
    }

    /// Enqueues `task` at `priority`, blocking up to `timeout` while the queue
    /// is full. The task is dropped when this returns `false`.
    pub fn push(&self, task: Task, priority: Priority, timeout: Duration) -> bool {
        self.push_timeout(task, priority, timeout).is_ok()
    }

    /// Like [`push`](Self::push) but hands the task back on failure.
    pub fn push_timeout(
        &self,
        task: Task,
        priority: Priority,
        timeout: Duration,
    ) -> std::result::Result<(), Task> {
        self.core.push_timeout(task, priority, timeout)
    }

    /// Enqueues without blocking; gives the task back if the queue is full.
    pub fn try_push(&self, task: Task, priority: Priority) -> std::result::Result<(), Task> {
        self.core.try_push(task, priority)
    }

    /// Takes the oldest task of the highest non-empty lane, if any.
    pub fn pop(&self) -> Option<Task> {
        self.core.pop()
    }

    /// Like [`pop`](Self::pop) but blocks up to `timeout` for a task. Returns
    /// `None` on timeout or when [`notify`](Self::notify) interrupts the wait.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Task> {
        self.core.pop_timeout(timeout)
    }

    /// Cancels a task that is still queued. Returns whether it was found;
    /// a task already handed to a consumer is out of reach and this is a
    /// no-op for it.
    pub fn remove(&self, id: TaskId) -> bool {
        // The closure is dropped here, outside the queue lock: it may run
        // arbitrary destructors.
        self.core.take_with(|lanes| lanes.remove(id)).is_some()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.core.read(|lanes| lanes.contains(id))
    }

    /// Drain barrier: blocks until the queue is empty. Returns `false` on
    /// timeout or when interrupted by [`notify`](Self::notify).
    pub fn wait(&self, timeout: Duration) -> bool {
        self.core.wait_drained(deadline_after(timeout))
    }

    /// Wakes every blocked waiter without touching the queued tasks.
    pub fn notify(&self) {
        self.core.notify();
    }

    /// Drops all queued tasks, returning how many were discarded.
    pub fn clear(&self) -> usize {
        self.core.clear()
    }

    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn len_at(&self, priority: Priority) -> usize {
        self.core.read(|lanes| lanes.lanes[priority.index()].len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (high, normal, low) = self.core.read(|lanes| {
            let at = |p: Priority| lanes.lanes[p.index()].len();
            (at(Priority::High), at(Priority::Normal), at(Priority::Low))
        });
        f.debug_struct("TaskQueue")
            .field("high", &high)
            .field("normal", &normal)
            .field("low", &low)
            .field("capacity", &self.capacity())
            .finish()
    }
}
