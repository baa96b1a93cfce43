//! Deadline helpers shared by the condvar-backed queues.

use parking_lot::{Condvar, MutexGuard};
use std::time::{Duration, Instant};

/// Converts a relative timeout into an absolute deadline. `None` means the
/// timeout is too large to represent and the wait is effectively unbounded.
pub(crate) fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Blocks on `condvar` until notified or `deadline` passes. Returns `true` if
/// the wait timed out.
pub(crate) fn wait_until<T>(
    condvar: &Condvar,
    guard: &mut MutexGuard<'_, T>,
    deadline: Option<Instant>,
) -> bool {
    match deadline {
        Some(deadline) => condvar.wait_until(guard, deadline).timed_out(),
        None => {
            condvar.wait(guard);
            false
        }
    }
}
