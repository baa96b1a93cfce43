//! Name-keyed lookup of live channels.
//!
//! Components that never share a handle directly can still meet on the same
//! [`Channel`] by name. The registry only holds weak references: it never
//! keeps a channel alive, and a name whose channel has been dropped is simply
//! reused by the next `open`.

use super::Channel;
use crate::error::{Error, Result};
use crate::runtime;
use crate::scheduler::Scheduler;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

static GLOBAL_REGISTRY: OnceLock<ChannelRegistry> = OnceLock::new();

trait Slot: Send + Sync {
    fn is_alive(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> Slot for Weak<Channel<T>> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
pub struct ChannelRegistry {
    slots: Mutex<HashMap<String, Box<dyn Slot>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by [`Channel::open`].
    pub fn global() -> &'static ChannelRegistry {
        GLOBAL_REGISTRY.get_or_init(ChannelRegistry::new)
    }

    /// Returns the live channel named `name`, or creates one delivering on
    /// the global scheduler.
    ///
    /// Fails with [`Error::ChannelType`] if a live channel of that name
    /// carries a different payload type.
    pub fn open<T>(&self, name: &str) -> Result<Arc<Channel<T>>>
    where
        T: Clone + Send + 'static,
    {
        self.open_or_create(name, || {
            runtime::global().map(|scheduler| Channel::with_scheduler(name, scheduler))
        })
    }

    /// Like [`open`](Self::open), but a newly created channel delivers on
    /// `scheduler`. An existing channel keeps the scheduler it was built with.
    pub fn open_with<T>(&self, name: &str, scheduler: &Arc<Scheduler>) -> Result<Arc<Channel<T>>>
    where
        T: Clone + Send + 'static,
    {
        self.open_or_create(name, || {
            Ok(Channel::with_scheduler(name, Arc::clone(scheduler)))
        })
    }

    fn open_or_create<T, F>(&self, name: &str, create: F) -> Result<Arc<Channel<T>>>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> Result<Arc<Channel<T>>>,
    {
        let mut slots = self.slots.lock();

        if let Some(slot) = slots.get(name) {
            match slot.as_any().downcast_ref::<Weak<Channel<T>>>() {
                Some(weak) => {
                    if let Some(channel) = weak.upgrade() {
                        return Ok(channel);
                    }
                }
                None if slot.is_alive() => return Err(Error::channel_type(name)),
                None => {}
            }
        }

        let channel = create()?;
        slots.insert(name.to_string(), Box::new(Arc::downgrade(&channel)));
        Ok(channel)
    }

    /// Whether a live channel is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.slots
            .lock()
            .get(name)
            .map_or(false, |slot| slot.is_alive())
    }

    /// Forgets entries whose channel has been dropped. Returns how many.
    pub fn prune(&self) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|_, slot| slot.is_alive());
        before - slots.len()
    }

    /// Number of entries, including ones not yet pruned.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock();
        let mut names: Vec<&String> = slots.keys().collect();
        names.sort();
        f.debug_struct("ChannelRegistry")
            .field("channels", &names)
            .finish()
    }
}
