//! Task-flow counters for diagnosing schedulers and workers.

pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
