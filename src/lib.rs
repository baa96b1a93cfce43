//! Courier - bounded task queues, a background scheduler and
//! scheduler-delivered publish/subscribe.
//!
//! A small intra-process concurrency substrate built on OS threads:
//!
//! - [`util::BoundedQueue`]: fixed-capacity blocking queue with timeouts
//! - [`scheduler::TaskQueue`]: the same, ordered by [`Priority`] with
//!   cancellation by [`TaskId`]
//! - [`Scheduler`]: one background thread draining a shared `TaskQueue`
//! - [`Worker`]: a private thread with its own FIFO inbox, for isolated,
//!   strictly ordered execution
//! - [`Channel`], [`Sender`], [`Receiver`]: broadcast channels whose
//!   subscribers run on a `Scheduler`, never on the publisher's stack
//!
//! # Quick Start
//!
//! ```no_run
//! use courier::prelude::*;
//! use std::sync::Arc;
//!
//! let scheduler = Arc::new(Scheduler::with_defaults().unwrap());
//! scheduler.start().unwrap();
//!
//! let channel: Arc<Channel<String>> = Channel::with_scheduler("greetings", scheduler.clone());
//! let _receiver = channel.subscribe(|msg: String| println!("got {}", msg));
//!
//! channel.sender().send("hello".to_string());
//! scheduler.wait(std::time::Duration::from_secs(1));
//! scheduler.shutdown();
//! ```
//!
//! Failures never surface as errors from queue, scheduler, worker or channel
//! operations: timeouts and refusals come back as `false`/`None`, and panics
//! inside tasks are caught and logged through the [`log`] facade. Only
//! construction returns [`Result`].

#![warn(missing_debug_implementations)]

pub mod channel;
pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod runtime;
pub mod scheduler;
pub mod telemetry;
pub mod util;

// Re-export key types at crate root
pub use channel::{Channel, ChannelRegistry, Receiver, Sender, Subscriber, SubscriberId};
pub use config::{SchedulerConfig, SchedulerConfigBuilder, WorkerConfig, WorkerConfigBuilder};
pub use error::{Error, Result};
pub use executor::{Priority, Task, TaskId, Worker};
pub use scheduler::{Scheduler, SchedulerState, TaskQueue};
