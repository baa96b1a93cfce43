//! Process-wide scheduler.
//!
//! Most code should construct a [`Scheduler`] and pass it where it is needed.
//! For the common case of one shared delivery thread per process, this module
//! keeps a lazily created global instance with an explicit teardown hook.

use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;
use parking_lot::RwLock;
use std::sync::Arc;

static GLOBAL_SCHEDULER: RwLock<Option<Arc<Scheduler>>> = RwLock::new(None);

/// Returns the global scheduler, creating and starting it with the default
/// config on first use.
pub fn global() -> Result<Arc<Scheduler>> {
    if let Some(scheduler) = GLOBAL_SCHEDULER.read().as_ref() {
        return Ok(Arc::clone(scheduler));
    }

    let mut slot = GLOBAL_SCHEDULER.write();
    if let Some(scheduler) = slot.as_ref() {
        return Ok(Arc::clone(scheduler));
    }

    let scheduler = Arc::new(Scheduler::new(SchedulerConfig::default())?);
    scheduler.start()?;
    log::debug!("global scheduler initialized");
    *slot = Some(Arc::clone(&scheduler));
    Ok(scheduler)
}

/// Returns the global scheduler without creating it.
pub fn current() -> Result<Arc<Scheduler>> {
    GLOBAL_SCHEDULER
        .read()
        .as_ref()
        .cloned()
        .ok_or(Error::NotInitialized)
}

pub fn init() -> Result<()> {
    init_with_config(SchedulerConfig::default())
}

/// Installs and starts a global scheduler built from `config`.
pub fn init_with_config(config: SchedulerConfig) -> Result<()> {
    let mut slot = GLOBAL_SCHEDULER.write();
    if slot.is_some() {
        return Err(Error::AlreadyInitialized);
    }

    let scheduler = Scheduler::new(config)?;
    scheduler.start()?;
    *slot = Some(Arc::new(scheduler));
    Ok(())
}

/// Takes the global scheduler out and shuts it down. Handles still holding
/// it (channels, for instance) see a stopped scheduler; the next call to
/// [`global`] creates a fresh one. No-op when none exists.
pub fn shutdown() {
    let scheduler = GLOBAL_SCHEDULER.write().take();
    if let Some(scheduler) = scheduler {
        scheduler.shutdown();
        log::debug!("global scheduler shut down");
    }
}
