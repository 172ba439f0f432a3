//! Query performance benchmarks: node scan and a one-hop extend/join.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use graph_engine::{Connection, Database};
use std::io::Write;
use std::time::Duration;

fn populate(size: u32) -> Database {
    let db = Database::in_memory().expect("in-memory database");
    let conn = Connection::new(&db);
    conn.query("CREATE NODE TABLE person(id INT64, age INT64, PRIMARY KEY(id))").unwrap();
    conn.query("CREATE REL TABLE knows(FROM person TO person)").unwrap();

    let mut people = tempfile::NamedTempFile::new().unwrap();
    for i in 0..size {
        writeln!(people, "{i},{}", 20 + (i % 60)).unwrap();
    }
    conn.query(&format!("COPY person FROM \"{}\"", people.path().to_str().unwrap())).unwrap();

    let mut edges = tempfile::NamedTempFile::new().unwrap();
    for i in 0..size.saturating_sub(1) {
        writeln!(edges, "{i},{}", i + 1).unwrap();
    }
    conn.query(&format!("COPY knows FROM \"{}\"", edges.path().to_str().unwrap())).unwrap();

    db
}

fn bench_simple_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("simple_scan");
    for size in [100u32, 1_000, 10_000] {
        let db = populate(size);
        let conn = Connection::new(&db);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| conn.query("MATCH (a:person) RETURN a.id AS id;").unwrap());
        });
    }
    group.finish();
}

fn bench_one_hop_extend(c: &mut Criterion) {
    let mut group = c.benchmark_group("one_hop_extend");
    for size in [100u32, 1_000, 10_000] {
        let db = populate(size);
        let conn = Connection::new(&db);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                conn.query("MATCH (a:person)-[r:knows]->(b:person) RETURN a.id AS id, b.id AS nbr;").unwrap()
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_simple_scan, bench_one_hop_extend
}
criterion_main!(benches);
