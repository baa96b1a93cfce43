//! Scheduler-delivered publish/subscribe channels.
//!
//! A [`Channel`] is a named broadcast medium shared by any number of
//! [`Sender`]s and [`Receiver`]s. Publishing never runs subscriber code on the
//! caller's stack: for every bound subscriber a delivery task is queued on the
//! channel's [`Scheduler`], which invokes the subscriber on its own thread.
//!
//! ```text
//!   Sender::send(v) ──► snapshot subscribers ──┬─► Task(v.clone(), S1) ─┐
//!                       (under channel lock)   ├─► Task(v.clone(), S2) ─┼─► Scheduler thread
//!                                              └─► Task(v.clone(), SN) ─┘
//! ```
//!
//! ## Rules
//! - The subscriber list is only touched under the channel's own lock.
//! - A delivery task owns its copy of the value and of the subscriber, so it
//!   stays valid after the channel and every handle to it are gone.
//! - A handler that publishes to its own channel just queues more tasks; it
//!   cannot recurse.
//! - A stopped scheduler drops deliveries; `send` reports how many were
//!   accepted.

mod receiver;
mod registry;
mod sender;

pub use receiver::Receiver;
pub use registry::ChannelRegistry;
pub use sender::Sender;

use crate::error::Result;
use crate::executor::{Priority, Task};
use crate::runtime;
use crate::scheduler::Scheduler;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handler invoked for each value published on a channel.
///
/// Implemented for every `Fn(T) + Send + Sync + 'static` closure.
pub trait Subscriber<T>: Send + Sync + 'static {
    fn on_message(&self, value: T);
}

impl<T, F> Subscriber<T> for F
where
    F: Fn(T) + Send + Sync + 'static,
{
    fn on_message(&self, value: T) {
        self(value)
    }
}

/// Identity of one subscriber registration on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Registration<T> = (SubscriberId, Arc<dyn Subscriber<T>>);

pub struct Channel<T> {
    name: String,
    scheduler: Arc<Scheduler>,
    subscribers: Mutex<Vec<Registration<T>>>,
    next_id: AtomicU64,
}

impl<T> Channel<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub(crate) fn register(&self, subscriber: Arc<dyn Subscriber<T>>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, subscriber));
        log::trace!("channel '{}': bound subscriber {:?}", self.name, id);
        id
    }

    pub(crate) fn unregister(&self, id: SubscriberId) -> bool {
        let removed = {
            let mut subscribers = self.subscribers.lock();
            subscribers
                .iter()
                .position(|(sid, _)| *sid == id)
                .map(|pos| subscribers.remove(pos))
        };

        // The subscriber itself is released outside the lock.
        let found = removed.is_some();
        drop(removed);
        if found {
            log::trace!("channel '{}': unbound subscriber {:?}", self.name, id);
        }
        found
    }
}

impl<T> Channel<T>
where
    T: Clone + Send + 'static,
{
    /// Creates a channel delivering on the process-wide scheduler.
    pub fn new<S: Into<String>>(name: S) -> Result<Arc<Self>> {
        Ok(Self::with_scheduler(name, runtime::global()?))
    }

    /// Creates a channel delivering on `scheduler`.
    pub fn with_scheduler<S: Into<String>>(name: S, scheduler: Arc<Scheduler>) -> Arc<Self> {
        let name = name.into();
        log::trace!("channel '{}': created", name);
        Arc::new(Self {
            name,
            scheduler,
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Opens the channel registered under `name` in the global
    /// [`ChannelRegistry`], creating it if needed.
    pub fn open(name: &str) -> Result<Arc<Self>> {
        ChannelRegistry::global().open(name)
    }

    pub fn sender(self: &Arc<Self>) -> Sender<T> {
        Sender::new(self)
    }

    pub fn subscribe<S>(self: &Arc<Self>, subscriber: S) -> Receiver<T>
    where
        S: Subscriber<T>,
    {
        Receiver::bind(self, subscriber)
    }

    /// Queues one delivery task per subscriber bound right now. Returns how
    /// many the scheduler accepted.
    pub(crate) fn publish(&self, value: T, priority: Priority) -> usize {
        let targets: Vec<Arc<dyn Subscriber<T>>> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        let fanout = targets.len();
        let mut accepted = 0;
        for subscriber in targets {
            let value = value.clone();
            let task = Task::new(move || subscriber.on_message(value));
            if self.scheduler.submit(task, priority) {
                accepted += 1;
            }
        }

        if accepted < fanout {
            log::debug!(
                "channel '{}': {} of {} deliveries dropped",
                self.name,
                fanout - accepted,
                fanout
            );
        } else {
            log::trace!("channel '{}': queued {} deliveries", self.name, accepted);
        }
        accepted
    }
}

impl<T> Drop for Channel<T> {
    fn drop(&mut self) {
        log::trace!("channel '{}': closed", self.name);
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}
