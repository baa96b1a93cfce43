//! Blocking machinery shared by [`BoundedQueue`](super::BoundedQueue) and
//! [`TaskQueue`](crate::scheduler::TaskQueue).
//!
//! [`QueueCore`] owns the lock, the capacity check, the three condvars
//! (`not_empty`, `not_full`, `drained`) and the `notify` epoch. How items are
//! laid out and which one leaves first is up to the [`Storage`].

use super::sync::{deadline_after, wait_until};
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Item layout behind a [`QueueCore`].
pub(crate) trait Storage {
    type Item;
    /// Where an item goes on push: `()` for a plain FIFO, a priority for
    /// laned storage.
    type Slot;

    fn len(&self) -> usize;
    fn push(&mut self, item: Self::Item, slot: Self::Slot);
    fn pop(&mut self) -> Option<Self::Item>;
    fn drain(&mut self) -> Vec<Self::Item>;
}

impl<T> Storage for VecDeque<T> {
    type Item = T;
    type Slot = ();

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn push(&mut self, item: T, _: ()) {
        self.push_back(item);
    }

    fn pop(&mut self) -> Option<T> {
        self.pop_front()
    }

    fn drain(&mut self) -> Vec<T> {
        VecDeque::drain(self, ..).collect()
    }
}

struct Guarded<S> {
    store: S,
    // Bumped by `notify`; a waiter that sees it change gives up.
    epoch: u64,
}

pub(crate) struct QueueCore<S> {
    state: Mutex<Guarded<S>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
    drained: Condvar,
}

impl<S: Storage> QueueCore<S> {
    pub(crate) fn new(store: S, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config("queue capacity must be > 0"));
        }

        Ok(Self {
            state: Mutex::new(Guarded { store, epoch: 0 }),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            drained: Condvar::new(),
        })
    }

    pub(crate) fn push_timeout(
        &self,
        item: S::Item,
        slot: S::Slot,
        timeout: Duration,
    ) -> std::result::Result<(), S::Item> {
        let deadline = deadline_after(timeout);
        let mut state = self.state.lock();
        let epoch = state.epoch;

        while state.store.len() >= self.capacity {
            let timed_out = wait_until(&self.not_full, &mut state, deadline);
            if state.epoch != epoch {
                return Err(item);
            }
            if timed_out && state.store.len() >= self.capacity {
                return Err(item);
            }
        }

        state.store.push(item, slot);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    pub(crate) fn try_push(&self, item: S::Item, slot: S::Slot) -> std::result::Result<(), S::Item> {
        let mut state = self.state.lock();
        if state.store.len() >= self.capacity {
            return Err(item);
        }

        state.store.push(item, slot);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    pub(crate) fn pop(&self) -> Option<S::Item> {
        self.take_with(|store| store.pop())
    }

    pub(crate) fn pop_timeout(&self, timeout: Duration) -> Option<S::Item> {
        let deadline = deadline_after(timeout);
        let mut state = self.state.lock();
        let epoch = state.epoch;

        loop {
            if let Some(item) = state.store.pop() {
                let now_empty = state.store.len() == 0;
                drop(state);

                self.after_removal(now_empty);
                return Some(item);
            }

            let timed_out = wait_until(&self.not_empty, &mut state, deadline);
            if state.epoch != epoch {
                return None;
            }
            if timed_out && state.store.len() == 0 {
                return None;
            }
        }
    }

    /// Removes whatever `f` picks out of the storage and wakes the producers
    /// and drain waiters that care.
    pub(crate) fn take_with<F>(&self, f: F) -> Option<S::Item>
    where
        F: FnOnce(&mut S) -> Option<S::Item>,
    {
        let mut state = self.state.lock();
        let item = f(&mut state.store)?;
        let now_empty = state.store.len() == 0;
        drop(state);

        self.after_removal(now_empty);
        Some(item)
    }

    pub(crate) fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        f(&self.state.lock().store)
    }

    /// Blocks until the storage is empty. `None` waits without a deadline.
    pub(crate) fn wait_drained(&self, deadline: Option<Instant>) -> bool {
        let mut state = self.state.lock();
        let epoch = state.epoch;

        while state.store.len() != 0 {
            let timed_out = wait_until(&self.drained, &mut state, deadline);
            if state.epoch != epoch {
                return false;
            }
            if timed_out {
                return state.store.len() == 0;
            }
        }
        true
    }

    pub(crate) fn notify(&self) {
        {
            let mut state = self.state.lock();
            state.epoch = state.epoch.wrapping_add(1);
        }
        self.not_empty.notify_all();
        self.not_full.notify_all();
        self.drained.notify_all();
    }

    /// Empties the storage. Items are dropped after the lock is released.
    pub(crate) fn clear(&self) -> usize {
        let removed = self.state.lock().store.drain();

        let count = removed.len();
        drop(removed);
        if count > 0 {
            self.not_full.notify_all();
            self.drained.notify_all();
        }
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().store.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    fn after_removal(&self, now_empty: bool) {
        self.not_full.notify_one();
        if now_empty {
            self.drained.notify_all();
        }
    }
}
