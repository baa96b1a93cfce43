pub use crate::channel::{Channel, Receiver, Sender, Subscriber};
pub use crate::config::{SchedulerConfig, WorkerConfig};
pub use crate::error::{Error, Result};
pub use crate::executor::{Priority, Task, TaskId, Worker};
pub use crate::scheduler::{Scheduler, SchedulerState};
