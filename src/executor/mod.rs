//! Task execution infrastructure.
//!
//! This module provides the task representation, panic isolation for task
//! bodies, and the isolated single-thread [`Worker`].

pub mod panic_handler;
pub mod task;
pub mod worker;

pub use panic_handler::{PanicHandler, PanicInfo};
pub use task::{Priority, Task, TaskId};
pub use worker::Worker;
