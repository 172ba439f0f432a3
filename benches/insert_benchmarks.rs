//! Bulk-copy performance benchmarks: `COPY FROM` at a few batch sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use graph_engine::{Connection, Database};
use std::io::Write;
use std::time::Duration;

fn fresh_person_table() -> Database {
    let db = Database::in_memory().expect("in-memory database");
    let conn = Connection::new(&db);
    conn.query("CREATE NODE TABLE person(id INT64, age INT64, PRIMARY KEY(id))").unwrap();
    db
}

fn bench_copy_from(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_from");
    let base_offset = 1_000_000u64; // keep PKs disjoint across iterations
    for (idx, &size) in [100u64, 1_000, 10_000].iter().enumerate() {
        let db = fresh_person_table();
        let conn = Connection::new(&db);
        let offset = base_offset * (idx as u64 + 1);
        let mut call_count = 0u64;

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &sz| {
            b.iter(|| {
                call_count += 1;
                let start = offset + call_count * sz;
                let mut file = tempfile::NamedTempFile::new().unwrap();
                for i in start..start + sz {
                    writeln!(file, "{i},{}", i % 100).unwrap();
                }
                conn.query(&format!("COPY person FROM \"{}\"", file.path().to_str().unwrap())).unwrap()
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
    targets = bench_copy_from
}
criterion_main!(benches);
