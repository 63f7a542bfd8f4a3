//! Model construction tests over the demo pipelines.

use std::collections::HashSet;

use crate::ir::{Expr, Stmt};
use crate::pipelines;

use super::access::AccessKind;
use super::dependence::{DependenceKind, Direction};
use super::Polytope;

#[test]
fn test_vadd_model_shape() {
    let polytope = Polytope::analyze(&pipelines::vadd(100)).unwrap();

    // a and b are written then read; c is only written.
    assert_eq!(polytope.accesses().len(), 5);
    assert_eq!(polytope.statements().len(), 3);
    for stmt in polytope.statements() {
        assert_eq!(stmt.writes.len(), 1);
        assert!(stmt.reads.len() == 0 || stmt.reads.len() == 2);
    }

    let deps = polytope.dependences();
    assert_eq!(deps.len(), 2);
    for dep in deps {
        assert_eq!(dep.kind, DependenceKind::Flow);
        assert_eq!(dep.source.kind, AccessKind::Write);
        assert_eq!(dep.target.kind, AccessKind::Read);
        // Equal at the one loop position: iterations never cross.
        let pos = dep.source.schedule.position_of(&format!("{}.x", dep.source.name));
        assert_eq!(dep.directions[pos.unwrap()], Direction::Equal);
    }
}

#[test]
fn test_vadd_statement_schedules_are_unique() {
    let polytope = Polytope::analyze(&pipelines::vadd(100)).unwrap();
    let schedules: HashSet<String> = polytope
        .statements()
        .iter()
        .map(|s| s.schedule.to_string())
        .collect();
    assert_eq!(schedules.len(), polytope.statements().len());
}

#[test]
fn test_matmul_model() {
    let polytope = Polytope::analyze(&pipelines::matmul(50)).unwrap();

    // a->a, b->b, c_init->c_read, c_init->c_update, c_update->c_read.
    assert_eq!(polytope.dependences().len(), 5);

    let kinds: Vec<DependenceKind> = polytope.dependences().iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds.iter().filter(|k| **k == DependenceKind::Flow).count(),
        4
    );
    assert_eq!(
        kinds
            .iter()
            .filter(|k| **k == DependenceKind::Output)
            .count(),
        1
    );

    // The reduction recurrence: write c and read c at the same point,
    // carried by the innermost loop.
    let recurrence = polytope
        .dependences()
        .iter()
        .find(|d| {
            d.kind == DependenceKind::Flow
                && d.source.kind == AccessKind::Write
                && d.source.name == "c"
                && d.source.schedule.position_of("c.k").is_some()
        })
        .expect("missing reduction dependence");
    let k_pos = recurrence.source.schedule.position_of("c.k").unwrap();
    assert_eq!(recurrence.directions[k_pos], Direction::Less);
    for (i, d) in recurrence.directions.iter().enumerate() {
        if i != k_pos {
            assert_eq!(*d, Direction::Equal);
        }
    }
}

#[test]
fn test_fibonacci_model() {
    let polytope = Polytope::analyze(&pipelines::fibonacci(100)).unwrap();

    // init->read x2, init->update write, update->read x2.
    assert_eq!(polytope.dependences().len(), 5);

    let carried = polytope.dependencies_involving("f.r");
    assert_eq!(carried.len(), 2);
    for dep in &carried {
        assert_eq!(dep.kind, DependenceKind::Flow);
        let pos = dep.source.schedule.position_of("f.r").unwrap();
        assert_eq!(dep.directions[pos], Direction::Less);
    }

    // The init loop sits in no dependence with both ends inside it.
    assert!(polytope.dependencies_involving("f.x").is_empty());
}

#[test]
fn test_nonlinear_model_is_unknown() {
    let polytope = Polytope::analyze(&pipelines::nonlinear(10)).unwrap();

    assert_eq!(polytope.dependences().len(), 1);
    let dep = &polytope.dependences()[0];
    assert_eq!(dep.kind, DependenceKind::Unknown);
    assert_eq!(dep.direction, Direction::Unknown);
    assert!(dep.directions.is_empty());
    assert!(!dep.source.args_affine);

    // Both nests reuse the counter name, so the verdict reaches both.
    assert_eq!(polytope.dependencies_involving("i").len(), 1);
}

#[test]
fn test_let_bound_reads_form_their_own_statement() {
    // let t = a(0) between two writes: the reads of the binding value
    // get a schedule point of their own.
    let stmt = Stmt::Realize {
        name: "a".to_string(),
        bounds: vec![(Expr::int(0), Expr::int(8))],
        body: Box::new(Stmt::ProducerConsumer {
            name: "a".to_string(),
            body: Box::new(Stmt::Block(vec![
                Stmt::Provide {
                    name: "a".to_string(),
                    args: vec![Expr::int(0)],
                    values: vec![Expr::int(1)],
                },
                Stmt::LetStmt {
                    name: "t".to_string(),
                    value: Expr::call("a", vec![Expr::int(0)]),
                    body: Box::new(Stmt::Provide {
                        name: "a".to_string(),
                        args: vec![Expr::int(1)],
                        values: vec![Expr::var("t")],
                    }),
                },
            ])),
        }),
    };

    let polytope = Polytope::analyze(&stmt).unwrap();
    assert_eq!(polytope.statements().len(), 3);

    let read_only = &polytope.statements()[1];
    assert!(read_only.writes.is_empty());
    assert_eq!(read_only.reads.len(), 1);

    // Three distinct schedule points at the region's top level.
    let schedules: Vec<String> = polytope
        .statements()
        .iter()
        .map(|s| s.schedule.to_string())
        .collect();
    assert_eq!(schedules, vec!["(0)", "(1)", "(2)"]);
}

#[test]
fn test_analysis_is_deterministic() {
    let stmt = pipelines::matmul(20);
    let first = Polytope::analyze(&stmt).unwrap();
    let second = Polytope::analyze(&stmt).unwrap();

    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.accesses().len(), second.accesses().len());
    assert_eq!(first.dependences().len(), second.dependences().len());
}

#[test]
fn test_reads_outside_any_region_are_ignored() {
    // No ProducerConsumer: nothing is analyzable.
    let stmt = Stmt::Realize {
        name: "a".to_string(),
        bounds: vec![(Expr::int(0), Expr::int(4))],
        body: Box::new(Stmt::Provide {
            name: "a".to_string(),
            args: vec![Expr::int(0)],
            values: vec![Expr::call("a", vec![Expr::int(0)])],
        }),
    };
    let polytope = Polytope::analyze(&stmt).unwrap();
    assert!(polytope.accesses().is_empty());
    assert!(polytope.statements().is_empty());
    assert!(polytope.dependences().is_empty());
}

#[test]
fn test_display_renders_statements_and_dependences() {
    let polytope = Polytope::analyze(&pipelines::vadd(10)).unwrap();
    let text = polytope.to_string();
    assert!(text.contains("Iteration Sets := (a.x)"));
    assert!(text.contains("Schedule := (0, a.x, 0)"));
    assert!(text.contains("Flow: a(a.x) -> a(c.x) : (-, =, =)"));
}
