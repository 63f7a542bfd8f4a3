//! Hand-lowered demo pipelines.
//!
//! Each builder returns the lowered form a front-end would hand to
//! the mid-end: arrays wrapped in `Realize` + `ProducerConsumer`,
//! serial loops, one `Provide` per store. Loop counters follow the
//! dotted `array.axis` naming discipline, so different nests never
//! share a counter name unless a pipeline wants them fused under one
//! verdict (see `nonlinear`).
//!
//! Shared by the unit tests, the integration tests, the benches and
//! the CLI.

use crate::ir::{DeviceApi, Expr, ForType, Stmt};

fn serial_for(name: &str, min: Expr, extent: Expr, body: Stmt) -> Stmt {
    Stmt::For {
        name: name.to_string(),
        min,
        extent,
        for_type: ForType::Serial,
        device_api: DeviceApi::None,
        body: Box::new(body),
    }
}

fn produce(name: &str, body: Stmt) -> Stmt {
    Stmt::ProducerConsumer {
        name: name.to_string(),
        body: Box::new(body),
    }
}

fn realize(name: &str, bounds: Vec<(i64, i64)>, body: Stmt) -> Stmt {
    Stmt::Realize {
        name: name.to_string(),
        bounds: bounds
            .into_iter()
            .map(|(min, extent)| (Expr::int(min), Expr::int(extent)))
            .collect(),
        body: Box::new(body),
    }
}

fn store(name: &str, args: Vec<Expr>, value: Expr) -> Stmt {
    Stmt::Provide {
        name: name.to_string(),
        args,
        values: vec![value],
    }
}

/// `c(i) = a(i) + b(i)` with `a(i) = i` and `b(i) = i + 3`, each
/// array computed in its own region.
pub fn vadd(size: i64) -> Stmt {
    let x = |n: &str| Expr::var(format!("{}.x", n));

    let c_loop = serial_for(
        "c.x",
        Expr::int(0),
        Expr::int(size),
        store(
            "c",
            vec![x("c")],
            Expr::call("a", vec![x("c")]) + Expr::call("b", vec![x("c")]),
        ),
    );

    let b_loop = serial_for(
        "b.x",
        Expr::int(0),
        Expr::int(size),
        store("b", vec![x("b")], x("b") + Expr::int(3)),
    );

    let a_loop = serial_for(
        "a.x",
        Expr::int(0),
        Expr::int(size),
        store("a", vec![x("a")], x("a")),
    );

    realize(
        "c",
        vec![(0, size)],
        realize(
            "a",
            vec![(0, size)],
            produce(
                "a",
                Stmt::Block(vec![
                    a_loop,
                    realize(
                        "b",
                        vec![(0, size)],
                        produce("b", Stmt::Block(vec![b_loop, produce("c", c_loop)])),
                    ),
                ]),
            ),
        ),
    )
}

/// Two-dimensional vector add: `c(x, y) = a(x, y) + b(x, y)`.
pub fn vadd2d(size: i64) -> Stmt {
    let xy = |n: &str| vec![Expr::var(format!("{}.x", n)), Expr::var(format!("{}.y", n))];
    let nest = |n: &str, body: Stmt| {
        serial_for(
            &format!("{}.y", n),
            Expr::int(0),
            Expr::int(size),
            serial_for(&format!("{}.x", n), Expr::int(0), Expr::int(size), body),
        )
    };

    let a_nest = nest(
        "a",
        store(
            "a",
            xy("a"),
            Expr::var("a.x") + Expr::var("a.y"),
        ),
    );
    let b_nest = nest(
        "b",
        store(
            "b",
            xy("b"),
            Expr::var("b.x") + Expr::var("b.y") + Expr::int(3),
        ),
    );
    let c_nest = nest(
        "c",
        store(
            "c",
            xy("c"),
            Expr::call("a", xy("c")) + Expr::call("b", xy("c")),
        ),
    );

    realize(
        "c",
        vec![(0, size), (0, size)],
        realize(
            "a",
            vec![(0, size), (0, size)],
            produce(
                "a",
                Stmt::Block(vec![
                    a_nest,
                    realize(
                        "b",
                        vec![(0, size), (0, size)],
                        produce("b", Stmt::Block(vec![b_nest, produce("c", c_nest)])),
                    ),
                ]),
            ),
        ),
    )
}

/// Matrix multiply with an explicit reduction loop:
/// `c(i, j) = 0; c(i, j) += a(k, j) * b(i, k)` over `k in [0, size)`.
pub fn matmul(size: i64) -> Stmt {
    let a_nest = serial_for(
        "a.j",
        Expr::int(0),
        Expr::int(size),
        serial_for(
            "a.i",
            Expr::int(0),
            Expr::int(size),
            store(
                "a",
                vec![Expr::var("a.i"), Expr::var("a.j")],
                Expr::var("a.i") + Expr::var("a.j"),
            ),
        ),
    );

    let b_nest = serial_for(
        "b.j",
        Expr::int(0),
        Expr::int(size),
        serial_for(
            "b.i",
            Expr::int(0),
            Expr::int(size),
            store(
                "b",
                vec![Expr::var("b.i"), Expr::var("b.j")],
                Expr::var("b.i") + Expr::var("b.j") + Expr::int(3),
            ),
        ),
    );

    let c_init = serial_for(
        "c.j",
        Expr::int(0),
        Expr::int(size),
        serial_for(
            "c.i",
            Expr::int(0),
            Expr::int(size),
            store(
                "c",
                vec![Expr::var("c.i"), Expr::var("c.j")],
                Expr::int(0),
            ),
        ),
    );

    let c_update = serial_for(
        "c.j",
        Expr::int(0),
        Expr::int(size),
        serial_for(
            "c.i",
            Expr::int(0),
            Expr::int(size),
            serial_for(
                "c.k",
                Expr::int(0),
                Expr::int(size),
                store(
                    "c",
                    vec![Expr::var("c.i"), Expr::var("c.j")],
                    Expr::call("c", vec![Expr::var("c.i"), Expr::var("c.j")])
                        + Expr::call("a", vec![Expr::var("c.k"), Expr::var("c.j")])
                            * Expr::call("b", vec![Expr::var("c.i"), Expr::var("c.k")]),
                ),
            ),
        ),
    );

    realize(
        "c",
        vec![(0, size), (0, size)],
        realize(
            "a",
            vec![(0, size), (0, size)],
            produce(
                "a",
                Stmt::Block(vec![
                    a_nest,
                    realize(
                        "b",
                        vec![(0, size), (0, size)],
                        produce(
                            "b",
                            Stmt::Block(vec![
                                b_nest,
                                produce("c", Stmt::Block(vec![c_init, c_update])),
                            ]),
                        ),
                    ),
                ]),
            ),
        ),
    )
}

/// `f(x) = x` then `f(r) = f(r - 2) + f(r - 1)` over `r in [2, size)`:
/// the update loop carries a genuine recurrence.
pub fn fibonacci(size: i64) -> Stmt {
    let init = serial_for(
        "f.x",
        Expr::int(0),
        Expr::int(size),
        store("f", vec![Expr::var("f.x")], Expr::var("f.x")),
    );

    let update = serial_for(
        "f.r",
        Expr::int(2),
        Expr::int(size - 2),
        store(
            "f",
            vec![Expr::var("f.r")],
            Expr::call("f", vec![Expr::var("f.r") - Expr::int(2)])
                + Expr::call("f", vec![Expr::var("f.r") - Expr::int(1)]),
        ),
    );

    realize(
        "f",
        vec![(0, size)],
        produce("f", Stmt::Block(vec![init, update])),
    )
}

/// `f(i*i) = i` then `g(i) = f(i*i)`: the squared subscript defeats
/// the affine model. Both nests reuse the counter name `i`, the way a
/// fused schedule would, so one verdict covers them.
pub fn nonlinear(size: i64) -> Stmt {
    let f_extent = (size - 1) * (size - 1) + 1;

    let f_loop = serial_for(
        "i",
        Expr::int(0),
        Expr::int(size),
        store(
            "f",
            vec![Expr::var("i") * Expr::var("i")],
            Expr::var("i"),
        ),
    );

    let g_loop = serial_for(
        "i",
        Expr::int(0),
        Expr::int(size),
        store(
            "g",
            vec![Expr::var("i")],
            Expr::call("f", vec![Expr::var("i") * Expr::var("i")]),
        ),
    );

    realize(
        "g",
        vec![(0, size)],
        realize(
            "f",
            vec![(0, f_extent)],
            produce("f", Stmt::Block(vec![f_loop, produce("g", g_loop)])),
        ),
    )
}
