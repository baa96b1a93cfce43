//! Publish/subscribe across a worker and the global scheduler.
//!
//! Run with `RUST_LOG=debug cargo run --example pubsub` to see the runtime's
//! own log output.

use courier::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Reading {
    sensor: &'static str,
    celsius: f64,
}

fn main() -> courier::Result<()> {
    env_logger::init();

    let readings: Arc<Channel<Reading>> = Channel::open("readings")?;
    let alerts: Arc<Channel<String>> = Channel::open("alerts")?;

    let alert_sender = alerts.sender();
    let _monitor = readings.subscribe(move |r: Reading| {
        if r.celsius > 30.0 {
            alert_sender.send_with_priority(
                format!("{} is hot: {:.1}C", r.sensor, r.celsius),
                Priority::High,
            );
        }
    });

    let total = Arc::new(AtomicU64::new(0));
    let counter = total.clone();
    let _tally = readings.subscribe(move |_: Reading| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let _printer = alerts.subscribe(|msg: String| println!("ALERT: {}", msg));

    // Sensors publish from a worker thread of their own.
    let sensors = Worker::new(WorkerConfig::builder().thread_name("sensors").build()?)?;
    let sender = readings.sender();
    sensors.submit(move || {
        for (i, sensor) in ["boiler", "attic", "cellar", "boiler"].into_iter().enumerate() {
            sender.send(Reading {
                sensor,
                celsius: 18.0 + 6.0 * i as f64,
            });
        }
    });
    sensors.wait();
    sensors.stop();

    let scheduler = courier::runtime::current()?;
    // Alerts are published from inside reading deliveries, so drain twice.
    scheduler.wait(Duration::from_secs(1));
    std::thread::sleep(Duration::from_millis(20));
    scheduler.wait(Duration::from_secs(1));
    println!("readings delivered: {}", total.load(Ordering::Relaxed));
    println!("{:?}", scheduler.metrics());

    courier::runtime::shutdown();
    Ok(())
}
