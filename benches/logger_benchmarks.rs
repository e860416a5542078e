//! Criterion benchmarks for rust_log_pipeline

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_log_pipeline::appenders::EncoderAdapter;
use rust_log_pipeline::prelude::*;
use rust_log_pipeline::{attrs, flatten, AttrMapPool};
use std::sync::Arc;
use std::thread;

fn sample_attrs() -> Vec<Attr> {
    attrs![
        "user_id" => 12345,
        "action" => "login",
        "latency_ms" => 42.5,
        "ok" => true,
        "peer" => vec![Attr::new("ip", "10.0.0.7"), Attr::new("port", 443)],
    ]
}

// ============================================================================
// Record Benchmarks
// ============================================================================

fn bench_record_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("message_only", |b| {
        b.iter(|| black_box(Record::new(Level::INFO, black_box("Test message"))));
    });

    group.bench_function("with_attrs", |b| {
        b.iter(|| {
            black_box(Record::new(Level::INFO, black_box("Test message")).with_attrs(sample_attrs()))
        });
    });

    group.finish();
}

// ============================================================================
// Attribute Flattening Benchmarks
// ============================================================================

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");
    group.throughput(Throughput::Elements(1));
    let attrs = sample_attrs();

    group.bench_function("pooled", |b| {
        b.iter(|| {
            let map = flatten(black_box(&attrs), None);
            black_box(map.len());
            map.free();
        });
    });

    group.bench_function("unpooled", |b| {
        let pool = AttrMapPool::new(0);
        b.iter(|| {
            let mut map = pool.acquire();
            map.extend_attrs(black_box(&attrs), None);
            black_box(map.len());
            map.free();
        });
    });

    group.finish();
}

// ============================================================================
// Handler Fan-out Benchmarks
// ============================================================================

fn bench_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("logging");
    group.throughput(Throughput::Elements(1));

    let filtered = Logger::builder()
        .level(Level::WARN)
        .adapter(EncoderAdapter::json(std::io::sink()))
        .build();
    group.bench_function("filtered_out", |b| {
        b.iter(|| filtered.debug(black_box("Debug message")));
    });

    let json = Logger::builder()
        .adapter(EncoderAdapter::json(std::io::sink()))
        .build();
    group.bench_function("json_sink", |b| {
        b.iter(|| json.info_attrs(black_box("Info message"), sample_attrs()));
    });

    let logfmt = Logger::builder()
        .adapter(EncoderAdapter::logfmt(std::io::sink()))
        .build();
    group.bench_function("logfmt_sink", |b| {
        b.iter(|| logfmt.info_attrs(black_box("Info message"), sample_attrs()));
    });

    let grouped = json.with_attrs(attrs!["service" => "api"]).with_group("req");
    group.bench_function("derived_group", |b| {
        b.iter(|| grouped.info_attrs(black_box("Info message"), sample_attrs()));
    });

    group.finish();
}

// ============================================================================
// Buffered Adapter Benchmarks
// ============================================================================

fn bench_buffered(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffered");
    group.throughput(Throughput::Elements(1));

    let buffered = BufferedAdapter::new(EncoderAdapter::json(std::io::sink()), 4096);
    let record = Record::new(Level::INFO, "queued").with_attrs(sample_attrs());
    group.bench_function("enqueue_and_flush_every_1000", |b| {
        let mut n = 0u32;
        b.iter(|| {
            buffered.handle(black_box(&record)).ok();
            n += 1;
            if n % 1000 == 0 {
                buffered.flush().ok();
            }
        });
    });

    let full = BufferedAdapter::new(DiscardAdapter, 1);
    full.handle(&record).ok();
    group.bench_function("drop_when_full", |b| {
        b.iter(|| full.handle(black_box(&record)).ok());
    });

    group.finish();
}

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements((threads * 1000) as u64));
        group.bench_function(format!("{}_threads", threads), |b| {
            b.iter(|| {
                let buffered = BufferedAdapter::new(EncoderAdapter::json(std::io::sink()), 10_000);
                let logger = Arc::new(Logger::builder().adapter(buffered).build());
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let logger = Arc::clone(&logger);
                        thread::spawn(move || {
                            for i in 0..1000 {
                                logger.info_attrs("work", attrs!["t" => t, "i" => i]);
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().ok();
                }
                logger.dispose().ok();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_record_creation,
    bench_flatten,
    bench_logging,
    bench_buffered,
    bench_concurrent_logging,
);
criterion_main!(benches);
