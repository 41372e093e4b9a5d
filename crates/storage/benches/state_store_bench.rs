//! Benchmarks for state store reads and writes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tabulon_core::Value;
use tabulon_storage::{InMemoryStore, Journal, LoggedStore, StateStore};

fn populated(size: usize) -> InMemoryStore {
    let store = InMemoryStore::with_capacity("bench", size);
    for i in 0..size {
        store
            .put(Value::Int64(i as i64), Some(Value::from(format!("value-{}", i))))
            .unwrap();
    }
    store
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("in_memory_get");

    for &size in &[1_000usize, 100_000] {
        let store = populated(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut i = 0usize;
            b.iter(|| {
                i = (i + 7) % size;
                black_box(store.get(&Value::Int64(i as i64)).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    group.bench_function("in_memory", |b| {
        let store = InMemoryStore::new("bench");
        let mut i = 0i64;
        b.iter(|| {
            i = (i + 1) % 10_000;
            store.put(Value::Int64(i), Some(Value::Int64(i))).unwrap();
        })
    });

    group.bench_function("logged", |b| {
        let store = LoggedStore::new(Arc::new(InMemoryStore::new("bench")));
        let mut i = 0i64;
        b.iter(|| {
            i = (i + 1) % 10_000;
            store.put(Value::Int64(i), Some(Value::Int64(i))).unwrap();
        })
    });

    group.finish();
}

fn bench_restore(c: &mut Criterion) {
    let journal = Journal::new();
    for i in 0..10_000i64 {
        journal.append(Value::Int64(i % 1_000), Some(Value::Int64(i)));
    }

    c.bench_function("journal_restore_10k", |b| {
        b.iter(|| {
            let store = InMemoryStore::new("restored");
            black_box(journal.restore(&store).unwrap())
        })
    });
}

criterion_group!(benches, bench_get, bench_put, bench_restore);
criterion_main!(benches);
