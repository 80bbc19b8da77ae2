//! Benchmarks for the temporal partitioner
//!
//! Run with: cargo bench --package dataset

use catalog::Interaction;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dataset::partition;

/// 20k users with 1..=40 interactions each, timestamps out of order
fn synthetic_log() -> Vec<Interaction> {
    let mut log = Vec::new();
    for user in 0..20_000u64 {
        let n = (user % 40) + 1;
        for i in 0..n {
            let ts = ((i * 7919 + user) % 1000) as i64;
            log.push(Interaction::new(format!("u{}", user), format!("i{}", i), ts));
        }
    }
    log
}

fn bench_partition(c: &mut Criterion) {
    let log = synthetic_log();

    c.bench_function("partition_20k_users", |b| {
        b.iter(|| {
            let split = partition(black_box(log.clone()));
            black_box(split)
        })
    });
}

criterion_group!(benches, bench_partition);
criterion_main!(benches);
