//! Stress tests for courier

use courier::prelude::*;
use courier::util::BoundedQueue;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
#[ignore] // Run with --ignored flag
fn stress_test_mpmc_no_loss_no_duplicates() {
    let queue = Arc::new(BoundedQueue::new(16).unwrap());
    let seen = Arc::new(Mutex::new(HashSet::new()));
    let producers = 8;
    let per_producer = 10_000;

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let queue = queue.clone();
            let seen = seen.clone();
            thread::spawn(move || {
                while let Some(v) = queue.pop_timeout(Duration::from_millis(500)) {
                    assert!(seen.lock().insert(v), "duplicate {}", v);
                }
            })
        })
        .collect();

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..per_producer {
                    assert!(queue.push(p * per_producer + i, Duration::from_secs(10)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    for consumer in consumers {
        consumer.join().unwrap();
    }

    assert_eq!(seen.lock().len(), producers * per_producer);
}

#[test]
#[ignore]
fn stress_test_random_priorities_and_cancellation() {
    let scheduler = Scheduler::new(
        SchedulerConfig::builder()
            .queue_capacity(64)
            .submit_timeout(Duration::from_secs(10))
            .build()
            .unwrap(),
    )
    .unwrap();
    scheduler.start().unwrap();

    let executed = Arc::new(AtomicUsize::new(0));
    let mut rng = rand::thread_rng();
    let mut submitted = 0;
    let mut cancelled = 0;

    for _ in 0..50_000 {
        let priority = match rng.gen_range(0..3) {
            0 => Priority::Low,
            1 => Priority::Normal,
            _ => Priority::High,
        };
        let counter = executed.clone();
        let id = scheduler
            .execute(
                move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                },
                priority,
            )
            .unwrap();
        submitted += 1;

        if rng.gen_bool(0.1) && scheduler.remove_task(id) {
            cancelled += 1;
        }
    }

    assert!(scheduler.wait(Duration::from_secs(30)));
    scheduler.shutdown();

    let metrics = scheduler.metrics();
    assert_eq!(metrics.tasks_cancelled, cancelled as u64);
    assert_eq!(
        executed.load(Ordering::Relaxed),
        submitted - cancelled - metrics.tasks_discarded as usize
    );
}

#[test]
#[ignore]
fn stress_test_subscribe_churn_while_publishing() {
    let scheduler = Arc::new(Scheduler::with_defaults().unwrap());
    scheduler.start().unwrap();
    let channel: Arc<Channel<u64>> = Channel::with_scheduler("churn", scheduler.clone());
    let delivered = Arc::new(AtomicUsize::new(0));

    let churners: Vec<_> = (0..4)
        .map(|_| {
            let channel = channel.clone();
            let delivered = delivered.clone();
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..1_000 {
                    let delivered = delivered.clone();
                    let receiver = channel.subscribe(move |_: u64| {
                        delivered.fetch_add(1, Ordering::Relaxed);
                    });
                    thread::sleep(Duration::from_micros(rng.gen_range(0..200)));
                    drop(receiver);
                }
            })
        })
        .collect();

    let sender = channel.sender();
    let mut accepted = 0;
    for v in 0..20_000u64 {
        accepted += sender.send(v);
    }

    for churner in churners {
        churner.join().unwrap();
    }
    assert!(scheduler.wait(Duration::from_secs(30)));
    thread::sleep(Duration::from_millis(50));
    scheduler.shutdown();

    let discarded = scheduler.metrics().tasks_discarded as usize;
    assert_eq!(delivered.load(Ordering::Relaxed) + discarded, accepted);
    assert_eq!(channel.subscriber_count(), 0);
}

#[test]
#[ignore]
fn stress_test_many_workers() {
    let workers: Vec<_> = (0..32).map(|_| Worker::with_capacity(4).unwrap()).collect();
    let order = Arc::new(Mutex::new(vec![Vec::new(); workers.len()]));

    for i in 0..200 {
        for (w, worker) in workers.iter().enumerate() {
            let order = order.clone();
            while !worker.submit({
                let order = order.clone();
                move || order.lock()[w].push(i)
            }) {
                thread::yield_now();
            }
        }
    }

    for worker in &workers {
        worker.wait();
        worker.stop();
    }

    let expected: Vec<i32> = (0..200).collect();
    assert!(order.lock().iter().all(|seq| *seq == expected));
}
