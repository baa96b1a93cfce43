pub mod bounded_queue;
pub(crate) mod queue_core;
pub(crate) mod sync;
pub(crate) mod thread;

pub use bounded_queue::BoundedQueue;
