//! Named thread spawning and self-aware joining.

use crate::error::{Error, Result};
use std::thread::{self, JoinHandle};

pub(crate) fn spawn_named<F>(name: &str, stack_size: Option<usize>, f: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let mut builder = thread::Builder::new().name(name.to_string());
    if let Some(stack_size) = stack_size {
        builder = builder.stack_size(stack_size);
    }
    builder.spawn(f).map_err(Error::Spawn)
}

/// Joins `handle` unless it is the calling thread, in which case the thread
/// is left to wind down on its own.
pub(crate) fn join_thread(handle: JoinHandle<()>, name: &str) {
    if handle.thread().id() == thread::current().id() {
        log::debug!("{}: stopped from its own thread, not joining", name);
        return;
    }
    if handle.join().is_err() {
        log::error!("{}: thread terminated abnormally", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_named() {
        let handle = spawn_named("courier-test", None, || {
            assert_eq!(thread::current().name(), Some("courier-test"));
        })
        .unwrap();
        join_thread(handle, "courier-test");
    }
}
