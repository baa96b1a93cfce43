//! Priority scheduling.
//!
//! [`TaskQueue`] orders pending work by [`Priority`]; [`Scheduler`] owns one
//! queue and the background thread that drains it.

pub mod priority;
pub mod service;

pub use priority::{Priority, TaskQueue};
pub use service::{Scheduler, SchedulerState};
