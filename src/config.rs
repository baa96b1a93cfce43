use crate::error::{Error, Result};
use std::time::Duration;

const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Settings for a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of tasks resident in the shared queue, across all
    /// priority levels.
    pub queue_capacity: usize,
    /// How long the background thread blocks on an empty queue before it
    /// re-checks the running flag.
    pub poll_interval: Duration,
    /// How long `submit` may block on a full queue before the task is dropped.
    pub submit_timeout: Duration,
    pub thread_name: String,
    pub stack_size: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            poll_interval: Duration::from_millis(100),
            submit_timeout: Duration::from_millis(100),
            thread_name: "courier-scheduler".to_string(),
            stack_size: Some(DEFAULT_STACK_SIZE),
        }
    }
}

impl SchedulerConfig {
    pub fn builder() -> SchedulerConfigBuilder {
        SchedulerConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::config("queue_capacity must be > 0"));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::config("poll_interval must be > 0"));
        }
        if self.thread_name.is_empty() {
            return Err(Error::config("thread_name must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SchedulerConfigBuilder {
    config: SchedulerConfig,
}

impl SchedulerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn submit_timeout(mut self, timeout: Duration) -> Self {
        self.config.submit_timeout = timeout;
        self
    }

    pub fn thread_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.thread_name = name.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<SchedulerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Settings for a [`Worker`](crate::Worker).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of tasks the private inbox holds before `post` starts refusing.
    pub inbox_capacity: usize,
    pub poll_interval: Duration,
    pub thread_name: String,
    pub stack_size: Option<usize>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 16,
            poll_interval: Duration::from_millis(100),
            thread_name: "courier-worker".to_string(),
            stack_size: Some(DEFAULT_STACK_SIZE),
        }
    }
}

impl WorkerConfig {
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.inbox_capacity == 0 {
            return Err(Error::config("inbox_capacity must be > 0"));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::config("poll_interval must be > 0"));
        }
        if self.thread_name.is_empty() {
            return Err(Error::config("thread_name must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: WorkerConfig::default(),
        }
    }

    pub fn inbox_capacity(mut self, capacity: usize) -> Self {
        self.config.inbox_capacity = capacity;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn thread_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.thread_name = name.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<WorkerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
