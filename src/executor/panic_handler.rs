use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Runs task bodies behind `catch_unwind` so a panicking task never takes
/// down the thread executing it. Counting is left to the caller's
/// [`Metrics`](crate::telemetry::Metrics).
#[derive(Debug, Clone, Copy)]
pub struct PanicHandler {
    context: &'static str,
}

impl PanicHandler {
    /// `context` names the executing loop in log output.
    pub fn new(context: &'static str) -> Self {
        Self { context }
    }

    pub fn execute<F, R>(&self, f: F) -> Result<R, PanicInfo>
    where
        F: FnOnce() -> R,
    {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => Ok(result),
            Err(payload) => {
                let info = PanicInfo::from_payload(payload);
                log::error!("{}: task panicked: {}", self.context, info.message);
                Err(info)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanicInfo {
    pub message: String,
}

impl PanicInfo {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };

        Self { message }
    }
}
