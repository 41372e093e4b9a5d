//! Benchmarks for tabulon-incremental.
//!
//! Target: single update through a three-node chain < 10μs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tabulon_core::{Key, Result, Value};
use tabulon_incremental::{Change, Topology, TopologyBuilder};

fn parse_int(v: &Value) -> Result<Value> {
    Ok(Value::Int32(v.parse_i32()?))
}

fn is_even(_: &Key, v: &Value) -> Result<bool> {
    Ok(v.as_i32().map_or(false, |i| i % 2 == 0))
}

fn chain(old_values: bool, through: bool) -> (Topology, tabulon_incremental::NodeId) {
    let mut builder = TopologyBuilder::default();
    let source = builder.create_source("topic1").unwrap();
    builder.materialize(source, "source-store").unwrap();
    let mapped = builder.map_values(source, parse_int).unwrap();
    let mut leaf = builder.filter(mapped, is_even).unwrap();
    if through {
        leaf = builder.through(leaf, "topic2").unwrap();
        builder.materialize(leaf, "through-store").unwrap();
    }
    if old_values {
        builder.enable_sending_old_values(leaf).unwrap();
    }
    (builder.build().unwrap(), leaf)
}

fn bench_change_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("change");

    group.bench_function("create_update", |b| {
        b.iter(|| Change::update(black_box(Value::Int32(42))))
    });

    group.bench_function("render", |b| {
        let change = Change::new(Some(Value::Int32(2)), Some(Value::Int32(1)));
        b.iter(|| black_box(&change).to_string())
    });

    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");

    for &(old_values, through) in &[(false, false), (true, false), (false, true), (true, true)] {
        let label = format!("old_values={}/through={}", old_values, through);
        group.bench_function(BenchmarkId::new("chain", label), |b| {
            let (mut topology, _) = chain(old_values, through);
            let mut i = 0u32;
            b.iter(|| {
                i = i.wrapping_add(1);
                let key = Value::Int32((i % 1024) as i32);
                topology
                    .process("topic1", key, Some(Value::from((i % 100).to_string())))
                    .unwrap();
            })
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for &keys in &[100usize, 10_000] {
        let (mut topology, leaf) = chain(false, false);
        for i in 0..keys {
            topology
                .process("topic1", Value::Int32(i as i32), Some(Value::from((i % 100).to_string())))
                .unwrap();
        }
        let getter = topology.value_getter(leaf).unwrap();

        group.bench_with_input(BenchmarkId::new("computed_chain", keys), &keys, |b, &keys| {
            let mut i = 0usize;
            b.iter(|| {
                i = (i + 1) % keys;
                black_box(getter.get(&Value::Int32(i as i32)).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_change_operations, bench_process, bench_lookup);
criterion_main!(benches);
