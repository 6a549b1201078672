//! Benchmarks for route resolution
//!
//! Run with: cargo bench

use agv_monitor_web::routes::{RouteEntry, RouteTable};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::collections::HashMap;

fn param_table() -> RouteTable {
    let mut entries: Vec<RouteEntry> = RouteTable::canonical()
        .unwrap()
        .entries()
        .to_vec();
    entries.push(RouteEntry::new("/robots/:id(\\d+)", "robot", "views/Robot.vue").unwrap());
    entries.push(
        RouteEntry::new("/tasks/:task/steps/:step", "task-step", "views/TaskStep.vue").unwrap(),
    );
    RouteTable::new(entries).unwrap()
}

fn bench_resolve(c: &mut Criterion) {
    let canonical = RouteTable::canonical().unwrap();
    let with_params = param_table();
    let paths = [
        "/",
        "/service/build_from_raw",
        "/task-query?robot=7&state=running#top",
        "/exception-records/",
        "/does-not-exist",
    ];

    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(paths.len() as u64));

    group.bench_function("canonical", |b| {
        b.iter(|| {
            for path in paths {
                black_box(canonical.resolve(black_box(path)));
            }
        })
    });

    group.bench_function("params", |b| {
        b.iter(|| {
            black_box(with_params.resolve(black_box("/robots/42")));
            black_box(with_params.resolve(black_box("/tasks/t-9/steps/3")));
        })
    });

    group.finish();
}

fn bench_href(c: &mut Criterion) {
    let table = param_table();
    let mut params = HashMap::new();
    params.insert("task".to_string(), "t 9".to_string());
    params.insert("step".to_string(), "3".to_string());

    c.bench_function("href", |b| {
        b.iter(|| table.href(black_box("task-step"), black_box(&params)).unwrap())
    });
}

fn bench_table_build(c: &mut Criterion) {
    c.bench_function("canonical_table", |b| {
        b.iter(|| RouteTable::canonical().unwrap())
    });
}

criterion_group!(benches, bench_resolve, bench_href, bench_table_build);
criterion_main!(benches);
