//! Buffered logging example
//!
//! Demonstrates batching, background flushing and drop-on-overflow.
//!
//! Run with: cargo run --example buffered_logging

use rust_log_pipeline::appenders::EncoderAdapter;
use rust_log_pipeline::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - Buffered Logging Example ===\n");

    let alerts = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&alerts);

    let buffered = Arc::new(
        BufferedAdapter::builder(EncoderAdapter::json(std::io::stdout()))
            .capacity(256)
            .flush_threshold(128)
            .flush_interval(Duration::from_millis(100))
            .on_overflow(Arc::new(move |total| {
                seen.store(total, Ordering::Relaxed);
            }))
            .build()?,
    );

    let logger = Arc::new(
        Logger::builder()
            .level(Level::DEBUG)
            .shared_adapter(buffered.clone())
            .attrs(vec![Attr::new("app", "buffered_logging")])
            .build(),
    );

    println!("1. Four threads logging concurrently:");
    let workers: Vec<_> = (0..4)
        .map(|id| {
            let logger = logger.with_group(&format!("worker{}", id));
            thread::spawn(move || {
                for i in 0..200 {
                    logger.debug_attrs("Processing item", vec![Attr::new("item", i)]);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    logger.flush()?;
    println!("\n2. Delivery report:");
    println!("   delivered:       {}", buffered.delivered());
    println!("   dropped:         {}", buffered.dropped());
    println!("   last alert:      {}", alerts.load(Ordering::Relaxed));
    println!("   drop rate:       {:.2}%", buffered.metrics().drop_rate());

    logger.dispose()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
