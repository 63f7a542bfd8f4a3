use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lumen::{auto_parallelize, pipelines, Polytope};

fn bench_analyze(c: &mut Criterion) {
    let stmt = pipelines::matmul(64);

    c.bench_function("analyze matmul", |b| {
        b.iter(|| Polytope::analyze(black_box(&stmt)).unwrap())
    });

    let polytope = Polytope::analyze(&stmt).unwrap();
    c.bench_function("auto_parallelize matmul", |b| {
        b.iter(|| auto_parallelize(black_box(&stmt), &polytope).unwrap())
    });
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
