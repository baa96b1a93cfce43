// isolated single-thread task runner
use super::panic_handler::PanicHandler;
use super::task::Task;
use crate::config::WorkerConfig;
use crate::error::Result;
use crate::telemetry::{Metrics, MetricsSnapshot};
use crate::util::sync::{deadline_after, wait_until};
use crate::util::thread::{join_thread, spawn_named};
use crate::util::BoundedQueue;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

struct Shared {
    inbox: BoundedQueue<Task>,
    // Accepted tasks not yet finished: queued plus the one running. This,
    // not the inbox length, is what admission checks against capacity.
    pending: Mutex<usize>,
    idle: Condvar,
    running: AtomicBool,
    config: WorkerConfig,
    metrics: Metrics,
    panic_handler: PanicHandler,
}

impl Shared {
    // main loop
    fn run(&self) {
        log::debug!("{}: started", self.config.thread_name);

        while self.running.load(Ordering::Acquire) {
            if let Some(task) = self.inbox.pop_timeout(self.config.poll_interval) {
                self.execute_task(task);
                self.settle(1);
            }
        }

        log::debug!("{}: stopped", self.config.thread_name);
    }

    fn execute_task(&self, task: Task) {
        let queued = task.enqueued().elapsed();
        let start = Instant::now();

        if self.panic_handler.execute(|| task.execute()).is_err() {
            self.metrics.record_panic();
        }
        self.metrics.record_execution(queued, start.elapsed());
    }

    fn settle(&self, finished: usize) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(finished);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }
}

/// A private execution context: one dedicated thread draining one small FIFO
/// inbox.
///
/// Tasks posted to the same worker run one at a time, in posting order, on
/// the same thread. Unlike [`Scheduler::submit`](crate::Scheduler::submit),
/// posting never blocks: a full inbox refuses the task immediately.
pub struct Worker {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Spawns the worker thread. The worker is running when this returns.
    pub fn new(config: WorkerConfig) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            inbox: BoundedQueue::new(config.inbox_capacity)?,
            pending: Mutex::new(0),
            idle: Condvar::new(),
            running: AtomicBool::new(true),
            config,
            metrics: Metrics::new(),
            panic_handler: PanicHandler::new("worker"),
        });

        let runner = Arc::clone(&shared);
        let handle = spawn_named(
            &shared.config.thread_name,
            shared.config.stack_size,
            move || runner.run(),
        )?;

        Ok(Self {
            shared,
            thread: Mutex::new(Some(handle)),
        })
    }

    pub fn with_capacity(inbox_capacity: usize) -> Result<Self> {
        Self::new(WorkerConfig::builder().inbox_capacity(inbox_capacity).build()?)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether a `post` now would be refused for lack of room. The task
    /// currently running counts against capacity until it returns.
    pub fn is_full(&self) -> bool {
        *self.shared.pending.lock() >= self.capacity()
    }

    /// Accepted tasks that have not finished yet, including a running one.
    pub fn pending(&self) -> usize {
        *self.shared.pending.lock()
    }

    /// Tasks waiting in the inbox (not counting one currently running).
    pub fn len(&self) -> usize {
        self.shared.inbox.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.inbox.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.inbox.capacity()
    }

    pub fn name(&self) -> &str {
        &self.shared.config.thread_name
    }

    /// Hands `task` to the worker. Returns `false` without blocking if the
    /// worker is stopped or already holds `capacity` unfinished tasks; the
    /// task is dropped then.
    pub fn post(&self, mut task: Task) -> bool {
        let mut pending = self.shared.pending.lock();
        if !self.is_running() {
            log::debug!("{}: stopped, refusing {}", self.name(), task.id());
            self.shared.metrics.record_rejected();
            return false;
        }
        if *pending >= self.capacity() {
            log::trace!("{}: at capacity, refusing {}", self.name(), task.id());
            self.shared.metrics.record_rejected();
            return false;
        }

        task.mark_enqueued();
        match self.shared.inbox.try_push(task) {
            Ok(()) => {
                *pending += 1;
                self.shared.metrics.record_submitted();
                true
            }
            Err(task) => {
                log::trace!("{}: inbox full, refusing {}", self.name(), task.id());
                self.shared.metrics.record_rejected();
                false
            }
        }
    }

    pub fn submit<F>(&self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.post(Task::new(f))
    }

    /// Blocks until every accepted task has finished running. Returns
    /// immediately on a stopped worker, and early if the worker is stopped
    /// while waiting.
    pub fn wait(&self) {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 && self.is_running() {
            self.shared.idle.wait(&mut pending);
        }
    }

    /// Like [`wait`](Self::wait) with an upper bound. Returns whether all
    /// accepted work finished in time.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = deadline_after(timeout);
        let mut pending = self.shared.pending.lock();
        while *pending > 0 && self.is_running() {
            if wait_until(&self.shared.idle, &mut pending, deadline) {
                break;
            }
        }
        *pending == 0
    }

    /// Stops the thread and joins it, discarding tasks still in the inbox. A
    /// task already running is allowed to finish. Idempotent.
    pub fn stop(&self) {
        let handle = {
            let mut slot = self.thread.lock();
            // Flipped under the admission lock so no `post` lands after the
            // final `clear` below.
            let _admission = self.shared.pending.lock();
            if !self.shared.running.swap(false, Ordering::AcqRel) {
                return;
            }
            slot.take()
        };

        self.shared.inbox.notify();
        if let Some(handle) = handle {
            join_thread(handle, self.name());
        }

        let discarded = self.shared.inbox.clear();
        self.shared.settle(discarded);
        // Waiters also give up on a stopped worker with work still running.
        self.shared.idle.notify_all();
        if discarded > 0 {
            self.shared.metrics.record_discarded(discarded);
            log::debug!("{}: discarded {} pending task(s)", self.name(), discarded);
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name())
            .field("running", &self.is_running())
            .field("pending", &self.pending())
            .field("inbox", &self.shared.inbox)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn worker(capacity: usize) -> Worker {
        let config = WorkerConfig::builder()
            .inbox_capacity(capacity)
            .poll_interval(Duration::from_millis(10))
            .thread_name("test-worker")
            .build()
            .unwrap();
        Worker::new(config).unwrap()
    }

    /// Occupies the worker thread until the returned sender fires.
    fn block_worker(worker: &Worker) -> crossbeam_channel::Sender<()> {
        let (release_tx, release_rx) = bounded::<()>(1);
        let (started_tx, started_rx) = bounded::<()>(1);
        assert!(worker.submit(move || {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv();
        }));
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        release_tx
    }

    #[test]
    fn test_runs_in_order_on_one_thread() {
        let worker = worker(64);
        let (tx, rx) = unbounded();

        for i in 0..50 {
            let tx = tx.clone();
            assert!(worker.submit(move || tx.send((i, thread::current().id())).unwrap()));
        }

        let results: Vec<_> = (0..50)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        let order: Vec<i32> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
        assert!(results.iter().all(|(_, id)| *id == results[0].1));
        assert_ne!(results[0].1, thread::current().id());
    }

    #[test]
    fn test_running_task_counts_against_capacity() {
        let worker = worker(1);
        let release = block_worker(&worker);

        // The inbox itself is empty; the running task still holds the slot.
        assert!(worker.is_empty());
        assert_eq!(worker.pending(), 1);
        assert!(worker.is_full());
        assert!(!worker.submit(|| {}));

        release.send(()).unwrap();
        assert!(worker.wait_timeout(Duration::from_secs(5)));
        assert_eq!(worker.pending(), 0);

        let (done_tx, done_rx) = bounded(1);
        assert!(worker.submit(move || done_tx.send(()).unwrap()));
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(worker.metrics().tasks_rejected, 1);
    }

    #[test]
    fn test_capacity_covers_queued_and_running() {
        let worker = worker(2);
        let release = block_worker(&worker);

        assert!(worker.submit(|| {}));
        assert_eq!(worker.len(), 1);
        assert!(!worker.submit(|| {}));

        release.send(()).unwrap();
        assert!(worker.wait_timeout(Duration::from_secs(5)));
        assert!(worker.submit(|| {}));
        assert!(worker.submit(|| {}));
    }

    #[test]
    fn test_wait_timeout_expires_while_running() {
        let worker = worker(1);
        let release = block_worker(&worker);

        assert!(!worker.wait_timeout(Duration::from_millis(20)));
        release.send(()).unwrap();
        assert!(worker.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn test_wait_drains_inbox() {
        let worker = worker(16);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = counter.clone();
            worker.submit(move || {
                thread::sleep(Duration::from_millis(1));
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        worker.wait();
        assert!(worker.is_empty());
        assert_eq!(worker.pending(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_stop_discards_pending() {
        let worker = worker(8);
        let release = block_worker(&worker);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            worker.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            release.send(()).unwrap();
        });
        worker.stop();
        releaser.join().unwrap();

        assert!(!worker.is_running());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(worker.metrics().tasks_discarded, 3);
        assert_eq!(worker.pending(), 0);
    }

    #[test]
    fn test_post_after_stop_is_refused() {
        let worker = worker(4);
        worker.stop();
        worker.stop();

        assert!(!worker.submit(|| {}));
        worker.wait();
        assert!(worker.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn test_panicking_task_is_isolated() {
        let worker = worker(4);
        let (tx, rx) = bounded(1);

        worker.submit(|| panic!("worker task failure"));
        worker.submit(move || tx.send("still alive").unwrap());

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "still alive");
        assert!(worker.is_running());
        assert_eq!(worker.metrics().tasks_panicked, 1);
    }

    #[test]
    fn test_with_capacity_rejects_zero() {
        assert!(Worker::with_capacity(0).is_err());
        let worker = Worker::with_capacity(2).unwrap();
        assert_eq!(worker.capacity(), 2);
        assert_eq!(worker.name(), "courier-worker");
    }
}
