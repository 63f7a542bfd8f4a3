//! The observable contract of the pass: an auto-parallelized pipeline
//! computes exactly the buffers the serial one does.

use lumen::{optimize, pipelines, runtime, Feature, Target};

fn poly_target() -> Target {
    Target::host().with_feature(Feature::ApplyPolyhedralModel)
}

fn assert_same_buffers(stmt: &lumen::ir::Stmt) {
    let serial = runtime::execute(stmt).unwrap();
    let optimized = optimize(stmt, &poly_target()).unwrap();
    let parallel = runtime::execute(&optimized).unwrap();

    let names: Vec<&String> = serial.buffers.keys().collect();
    assert_eq!(names, parallel.buffers.keys().collect::<Vec<_>>());
    for name in names {
        assert_eq!(
            serial.buffers[name].data, parallel.buffers[name].data,
            "buffer {} diverged",
            name
        );
    }
}

#[test]
fn test_vadd_results() {
    let stmt = pipelines::vadd(64);
    let store = runtime::execute(&stmt).unwrap();
    let c = store.buffer("c").unwrap();
    for i in 0..64i64 {
        // c(i) = i + (i + 3)
        assert_eq!(c.get("c", &[i]).unwrap(), 2 * i + 3);
    }
    assert_same_buffers(&stmt);
}

#[test]
fn test_vadd2d_results() {
    let stmt = pipelines::vadd2d(16);
    let store = runtime::execute(&stmt).unwrap();
    let c = store.buffer("c").unwrap();
    for y in 0..16i64 {
        for x in 0..16i64 {
            assert_eq!(c.get("c", &[x, y]).unwrap(), 2 * (x + y) + 3);
        }
    }
    assert_same_buffers(&stmt);
}

#[test]
fn test_matmul_results() {
    let size = 8i64;
    let stmt = pipelines::matmul(size);
    let store = runtime::execute(&stmt).unwrap();
    let c = store.buffer("c").unwrap();

    // c(i, j) = sum_k a(k, j) * b(i, k) with a(i, j) = i + j and
    // b(i, j) = i + j + 3.
    for j in 0..size {
        for i in 0..size {
            let expected: i64 = (0..size).map(|k| (k + j) * (i + k + 3)).sum();
            assert_eq!(c.get("c", &[i, j]).unwrap(), expected);
        }
    }
    assert_same_buffers(&stmt);
}

#[test]
fn test_fibonacci_results() {
    let stmt = pipelines::fibonacci(20);
    let store = runtime::execute(&stmt).unwrap();
    let f = store.buffer("f").unwrap();

    assert_eq!(f.get("f", &[0]).unwrap(), 0);
    assert_eq!(f.get("f", &[1]).unwrap(), 1);
    assert_eq!(f.get("f", &[10]).unwrap(), 55);
    assert_eq!(f.get("f", &[19]).unwrap(), 4181);
    assert_same_buffers(&stmt);
}

#[test]
fn test_nonlinear_results() {
    let stmt = pipelines::nonlinear(10);
    let store = runtime::execute(&stmt).unwrap();
    let g = store.buffer("g").unwrap();
    for i in 0..10i64 {
        assert_eq!(g.get("g", &[i]).unwrap(), i);
    }
    assert_same_buffers(&stmt);
}
