//! Fixed-capacity blocking queue.
//!
//! [`BoundedQueue`] is the backpressure primitive of the crate: producers
//! block (up to a timeout) while the queue is full instead of growing it, and
//! consumers can block (up to a timeout) while it is empty. Nothing is ever
//! dropped or overwritten silently.

use super::queue_core::QueueCore;
use super::sync::deadline_after;
use crate::error::Result;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Thread-safe FIFO ring buffer with a hard capacity.
pub struct BoundedQueue<T> {
    core: QueueCore<VecDeque<T>>,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    ///
    /// A capacity of zero is rejected with [`Error::Config`](crate::Error::Config).
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            core: QueueCore::new(VecDeque::with_capacity(capacity), capacity)?,
        })
    }

    /// Pushes `value`, blocking while the queue is full.
    ///
    /// Returns `false` if no slot freed up within `timeout`, or if
    /// [`notify`](Self::notify) was called while waiting. The value is
    /// dropped in that case.
    pub fn push(&self, value: T, timeout: Duration) -> bool {
        self.push_timeout(value, timeout).is_ok()
    }

    /// Like [`push`](Self::push) but hands the value back on failure.
    pub fn push_timeout(&self, value: T, timeout: Duration) -> std::result::Result<(), T> {
        self.core.push_timeout(value, (), timeout)
    }

    /// Pushes without blocking. Gives the value back if the queue is full.
    pub fn try_push(&self, value: T) -> std::result::Result<(), T> {
        self.core.try_push(value, ())
    }

    /// Pops the oldest item without blocking.
    pub fn pop(&self) -> Option<T> {
        self.core.pop()
    }

    /// Pops the oldest item, blocking up to `timeout` for one to arrive.
    ///
    /// Returns `None` on timeout or when [`notify`](Self::notify) interrupts
    /// the wait.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        self.core.pop_timeout(timeout)
    }

    /// Blocks until the queue is empty. Returns `false` on timeout or when
    /// interrupted by [`notify`](Self::notify).
    pub fn wait_empty(&self, timeout: Duration) -> bool {
        self.core.wait_drained(deadline_after(timeout))
    }

    /// Blocks until the queue is empty or [`notify`](Self::notify) is called.
    pub fn wait_until_empty(&self) -> bool {
        self.core.wait_drained(None)
    }

    /// Wakes every blocked producer, consumer and drain waiter. Each of them
    /// returns its failure value without completing its operation; the queue
    /// contents are left untouched.
    pub fn notify(&self) {
        self.core.notify();
    }

    /// Drops every queued item and returns how many there were.
    pub fn clear(&self) -> usize {
        self.core.clear()
    }

    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.core.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
