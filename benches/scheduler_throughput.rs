//! Benchmarks for queue, scheduler and channel throughput

use courier::prelude::*;
use courier::util::BoundedQueue;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn bench_bounded_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_queue");

    for capacity in [1, 16, 1024] {
        group.bench_with_input(BenchmarkId::new("spsc_10k", capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let queue = Arc::new(BoundedQueue::new(capacity).unwrap());
                let producer = {
                    let queue = queue.clone();
                    thread::spawn(move || {
                        for i in 0..10_000u32 {
                            queue.push(i, Duration::from_secs(5));
                        }
                    })
                };
                let mut sum = 0u64;
                for _ in 0..10_000 {
                    sum += queue.pop_timeout(Duration::from_secs(5)).unwrap_or(0) as u64;
                }
                producer.join().unwrap();
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn bench_scheduler_submit(c: &mut Criterion) {
    let scheduler = Scheduler::new(
        SchedulerConfig::builder()
            .queue_capacity(4096)
            .submit_timeout(Duration::from_secs(5))
            .build()
            .unwrap(),
    )
    .unwrap();
    scheduler.start().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    c.bench_function("scheduler_submit_1k", |b| {
        b.iter(|| {
            for _ in 0..1_000 {
                let counter = counter.clone();
                scheduler.execute(
                    move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                    },
                    Priority::Normal,
                );
            }
            scheduler.wait(Duration::from_secs(5));
        });
    });

    scheduler.shutdown();
}

fn bench_channel_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_fan_out");
    let scheduler = Arc::new(
        Scheduler::new(
            SchedulerConfig::builder()
                .queue_capacity(8192)
                .submit_timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
        )
        .unwrap(),
    );
    scheduler.start().unwrap();

    for subscribers in [1, 8, 64] {
        let channel: Arc<Channel<u64>> = Channel::with_scheduler("bench", scheduler.clone());
        let _receivers: Vec<_> = (0..subscribers)
            .map(|_| channel.subscribe(|v: u64| {
                black_box(v);
            }))
            .collect();
        let sender = channel.sender();

        group.bench_with_input(BenchmarkId::from_parameter(subscribers), &subscribers, |b, _| {
            b.iter(|| {
                for v in 0..100u64 {
                    sender.send(v);
                }
                scheduler.wait(Duration::from_secs(5));
            });
        });
    }

    group.finish();
    scheduler.shutdown();
}

criterion_group!(
    benches,
    bench_bounded_queue,
    bench_scheduler_submit,
    bench_channel_fan_out
);
criterion_main!(benches);
