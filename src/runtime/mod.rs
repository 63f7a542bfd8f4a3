//! Reference interpreter for lowered pipelines.
//!
//! Executes a statement tree directly: `Realize` allocates a buffer,
//! `Provide` stores one element, `Call` loads one. Loops marked
//! `Parallel` fan their iterations out with rayon; each iteration
//! evaluates against a read snapshot of the buffers plus a private
//! write overlay, and the overlays are committed in iteration order,
//! so results are deterministic whatever the actual interleaving.
//!
//! This is the observation side of the auto-parallelizer: a pipeline
//! must compute the same buffers before and after the pass.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use thiserror::Error;

use crate::ir::{Expr, ForType, Stmt};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("undefined scalar '{0}'")]
    UndefinedVariable(String),

    #[error("undefined buffer '{0}'")]
    UndefinedBuffer(String),

    #[error("access to '{array}' at {site:?} is out of bounds")]
    OutOfBounds { array: String, site: Vec<i64> },

    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

/// A realized array. The first subscript is the fastest-moving one.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub bounds: Vec<(i64, i64)>,
    pub data: Vec<i64>,
}

impl Buffer {
    fn new(bounds: Vec<(i64, i64)>) -> Self {
        let size = bounds.iter().map(|(_, extent)| (*extent).max(0)).product::<i64>() as usize;
        Self {
            bounds,
            data: vec![0; size],
        }
    }

    fn flat_index(&self, array: &str, site: &[i64]) -> Result<usize, RuntimeError> {
        let oob = || RuntimeError::OutOfBounds {
            array: array.to_string(),
            site: site.to_vec(),
        };

        if site.len() != self.bounds.len() {
            return Err(oob());
        }
        let mut index = 0usize;
        let mut stride = 1usize;
        for (coord, (min, extent)) in site.iter().zip(&self.bounds) {
            let offset = coord - min;
            if offset < 0 || offset >= *extent {
                return Err(oob());
            }
            index += offset as usize * stride;
            stride *= *extent as usize;
        }
        Ok(index)
    }

    pub fn get(&self, array: &str, site: &[i64]) -> Result<i64, RuntimeError> {
        Ok(self.data[self.flat_index(array, site)?])
    }

    fn set(&mut self, array: &str, site: &[i64], value: i64) -> Result<(), RuntimeError> {
        let index = self.flat_index(array, site)?;
        self.data[index] = value;
        Ok(())
    }
}

/// All buffers realized during one execution. Buffers outlive their
/// `Realize` scope so tests can inspect intermediate arrays too.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub buffers: BTreeMap<String, Buffer>,
}

impl Store {
    pub fn buffer(&self, name: &str) -> Result<&Buffer, RuntimeError> {
        self.buffers
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedBuffer(name.to_string()))
    }

    fn read(&self, name: &str, site: &[i64]) -> Result<i64, RuntimeError> {
        self.buffer(name)?.get(name, site)
    }
}

/// Writes collected by one parallel iteration, keyed by buffer and
/// flat element index. Within an iteration, later writes to the same
/// element win; across iterations, overlays commit in loop order.
type Overlay = HashMap<(String, usize), i64>;

type Env = HashMap<String, i64>;

/// Execute a pipeline and return its buffers.
pub fn execute(stmt: &Stmt) -> Result<Store, RuntimeError> {
    let mut store = Store::default();
    let mut env = Env::new();
    exec(stmt, &mut env, &mut store)?;
    Ok(store)
}

fn exec(stmt: &Stmt, env: &mut Env, store: &mut Store) -> Result<(), RuntimeError> {
    match stmt {
        Stmt::Block(stmts) => {
            for s in stmts {
                exec(s, env, store)?;
            }
            Ok(())
        }

        Stmt::ProducerConsumer { body, .. } => exec(body, env, store),

        Stmt::Realize { name, bounds, body } => {
            let bounds = bounds
                .iter()
                .map(|(min, extent)| Ok((eval(min, env, store, None)?, eval(extent, env, store, None)?)))
                .collect::<Result<Vec<_>, RuntimeError>>()?;
            store.buffers.insert(name.clone(), Buffer::new(bounds));
            exec(body, env, store)
        }

        Stmt::LetStmt { name, value, body } => {
            let value = eval(value, env, store, None)?;
            let saved = env.insert(name.clone(), value);
            let result = exec(body, env, store);
            restore(env, name, saved);
            result
        }

        Stmt::Provide { name, args, values } => {
            let (site, value) = provide_site(name, args, values, env, store, None)?;
            let buffer = store
                .buffers
                .get_mut(name)
                .ok_or_else(|| RuntimeError::UndefinedBuffer(name.to_string()))?;
            buffer.set(name, &site, value)
        }

        Stmt::For {
            name,
            min,
            extent,
            for_type,
            body,
            ..
        } => {
            let min = eval(min, env, store, None)?;
            let extent = eval(extent, env, store, None)?;

            if *for_type == ForType::Parallel {
                let snapshot: &Store = store;
                let base_env: &Env = env;
                let overlays = (0..extent.max(0))
                    .into_par_iter()
                    .map(|k| {
                        let mut env = base_env.clone();
                        env.insert(name.clone(), min + k);
                        let mut overlay = Overlay::new();
                        collect(body, &mut env, snapshot, &mut overlay)?;
                        Ok(overlay)
                    })
                    .collect::<Result<Vec<_>, RuntimeError>>()?;

                for overlay in overlays {
                    commit(overlay, store)?;
                }
                Ok(())
            } else {
                let saved = env.get(name).copied();
                for i in min..min + extent.max(0) {
                    env.insert(name.clone(), i);
                    exec(body, env, store)?;
                }
                restore(env, name, saved);
                Ok(())
            }
        }
    }
}

/// Collect-mode execution inside a parallel iteration: buffers are
/// read-only, writes land in the overlay. Nested parallel loops run
/// sequentially here; their iterations are independent anyway.
fn collect(
    stmt: &Stmt,
    env: &mut Env,
    store: &Store,
    overlay: &mut Overlay,
) -> Result<(), RuntimeError> {
    match stmt {
        Stmt::Block(stmts) => {
            for s in stmts {
                collect(s, env, store, overlay)?;
            }
            Ok(())
        }

        Stmt::ProducerConsumer { body, .. } => collect(body, env, store, overlay),

        Stmt::Realize { name, .. } => Err(RuntimeError::Unsupported(format!(
            "realize of '{}' inside a parallel loop",
            name
        ))),

        Stmt::LetStmt { name, value, body } => {
            let value = eval(value, env, store, Some(overlay))?;
            let saved = env.insert(name.clone(), value);
            let result = collect(body, env, store, overlay);
            restore(env, name, saved);
            result
        }

        Stmt::Provide { name, args, values } => {
            let (site, value) = provide_site(name, args, values, env, store, Some(overlay))?;
            let index = store.buffer(name)?.flat_index(name, &site)?;
            overlay.insert((name.clone(), index), value);
            Ok(())
        }

        Stmt::For {
            name,
            min,
            extent,
            body,
            ..
        } => {
            let min = eval(min, env, store, Some(overlay))?;
            let extent = eval(extent, env, store, Some(overlay))?;
            let saved = env.get(name).copied();
            for i in min..min + extent.max(0) {
                env.insert(name.clone(), i);
                collect(body, env, store, overlay)?;
            }
            restore(env, name, saved);
            Ok(())
        }
    }
}

fn provide_site(
    name: &str,
    args: &[Expr],
    values: &[Expr],
    env: &mut Env,
    store: &Store,
    overlay: Option<&Overlay>,
) -> Result<(Vec<i64>, i64), RuntimeError> {
    if values.len() != 1 {
        return Err(RuntimeError::Unsupported(format!(
            "multi-valued provide to '{}'",
            name
        )));
    }
    let value = eval(&values[0], env, store, overlay)?;
    let site = args
        .iter()
        .map(|a| eval(a, env, store, overlay))
        .collect::<Result<Vec<_>, RuntimeError>>()?;
    Ok((site, value))
}

fn commit(overlay: Overlay, store: &mut Store) -> Result<(), RuntimeError> {
    for ((name, index), value) in overlay {
        let buffer = store
            .buffers
            .get_mut(&name)
            .ok_or_else(|| RuntimeError::UndefinedBuffer(name.clone()))?;
        buffer.data[index] = value;
    }
    Ok(())
}

fn restore(env: &mut Env, name: &str, saved: Option<i64>) {
    match saved {
        Some(v) => {
            env.insert(name.to_string(), v);
        }
        None => {
            env.remove(name);
        }
    }
}

fn eval(
    expr: &Expr,
    env: &mut Env,
    store: &Store,
    overlay: Option<&Overlay>,
) -> Result<i64, RuntimeError> {
    match expr {
        Expr::IntImm(v) => Ok(*v),
        Expr::Variable { name, .. } => env
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone())),
        Expr::Add(a, b) => Ok(eval(a, env, store, overlay)?.wrapping_add(eval(b, env, store, overlay)?)),
        Expr::Sub(a, b) => Ok(eval(a, env, store, overlay)?.wrapping_sub(eval(b, env, store, overlay)?)),
        Expr::Mul(a, b) => Ok(eval(a, env, store, overlay)?.wrapping_mul(eval(b, env, store, overlay)?)),
        Expr::Let { name, value, body } => {
            let value = eval(value, env, store, overlay)?;
            let saved = env.insert(name.clone(), value);
            let result = eval(body, env, store, overlay);
            restore(env, name, saved);
            result
        }
        Expr::Select {
            condition,
            true_value,
            false_value,
        } => {
            if eval(condition, env, store, overlay)? != 0 {
                eval(true_value, env, store, overlay)
            } else {
                eval(false_value, env, store, overlay)
            }
        }
        Expr::Call { name, args } => {
            let site = args
                .iter()
                .map(|a| eval(a, env, store, overlay))
                .collect::<Result<Vec<_>, RuntimeError>>()?;
            if let Some(overlay) = overlay {
                let index = store.buffer(name)?.flat_index(name, &site)?;
                if let Some(value) = overlay.get(&(name.clone(), index)) {
                    return Ok(*value);
                }
            }
            store.read(name, &site)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{DeviceApi, Expr, ForType, Stmt};

    fn loop_stmt(name: &str, extent: i64, for_type: ForType, body: Stmt) -> Stmt {
        Stmt::For {
            name: name.to_string(),
            min: Expr::int(0),
            extent: Expr::int(extent),
            for_type,
            device_api: DeviceApi::None,
            body: Box::new(body),
        }
    }

    fn fill(for_type: ForType) -> Stmt {
        Stmt::Realize {
            name: "a".to_string(),
            bounds: vec![(Expr::int(0), Expr::int(8))],
            body: Box::new(loop_stmt(
                "x",
                8,
                for_type,
                Stmt::Provide {
                    name: "a".to_string(),
                    args: vec![Expr::var("x")],
                    values: vec![Expr::var("x") * Expr::int(2)],
                },
            )),
        }
    }

    #[test]
    fn test_serial_fill() {
        let store = execute(&fill(ForType::Serial)).unwrap();
        let a = store.buffer("a").unwrap();
        assert_eq!(a.data, vec![0, 2, 4, 6, 8, 10, 12, 14]);
    }

    #[test]
    fn test_parallel_fill_matches_serial() {
        let serial = execute(&fill(ForType::Serial)).unwrap();
        let parallel = execute(&fill(ForType::Parallel)).unwrap();
        assert_eq!(
            serial.buffer("a").unwrap().data,
            parallel.buffer("a").unwrap().data
        );
    }

    #[test]
    fn test_parallel_iteration_reads_snapshot() {
        // b(x) = a(x) + 1 in parallel: reads must see the pre-loop a.
        let stmt = Stmt::Realize {
            name: "a".to_string(),
            bounds: vec![(Expr::int(0), Expr::int(4))],
            body: Box::new(Stmt::Realize {
                name: "b".to_string(),
                bounds: vec![(Expr::int(0), Expr::int(4))],
                body: Box::new(Stmt::Block(vec![
                    loop_stmt(
                        "x",
                        4,
                        ForType::Serial,
                        Stmt::Provide {
                            name: "a".to_string(),
                            args: vec![Expr::var("x")],
                            values: vec![Expr::var("x") + Expr::int(10)],
                        },
                    ),
                    loop_stmt(
                        "x",
                        4,
                        ForType::Parallel,
                        Stmt::Provide {
                            name: "b".to_string(),
                            args: vec![Expr::var("x")],
                            values: vec![Expr::call("a", vec![Expr::var("x")]) + Expr::int(1)],
                        },
                    ),
                ])),
            }),
        };
        let store = execute(&stmt).unwrap();
        assert_eq!(store.buffer("b").unwrap().data, vec![11, 12, 13, 14]);
    }

    #[test]
    fn test_overlay_serves_intra_iteration_reads() {
        // Each parallel iteration writes a(x) then reads it back.
        let body = Stmt::Block(vec![
            Stmt::Provide {
                name: "a".to_string(),
                args: vec![Expr::var("x")],
                values: vec![Expr::var("x") + Expr::int(5)],
            },
            Stmt::Provide {
                name: "a".to_string(),
                args: vec![Expr::var("x")],
                values: vec![Expr::call("a", vec![Expr::var("x")]) * Expr::int(2)],
            },
        ]);
        let stmt = Stmt::Realize {
            name: "a".to_string(),
            bounds: vec![(Expr::int(0), Expr::int(3))],
            body: Box::new(loop_stmt("x", 3, ForType::Parallel, body)),
        };
        let store = execute(&stmt).unwrap();
        assert_eq!(store.buffer("a").unwrap().data, vec![10, 12, 14]);
    }

    #[test]
    fn test_out_of_bounds_is_reported() {
        let stmt = Stmt::Realize {
            name: "a".to_string(),
            bounds: vec![(Expr::int(0), Expr::int(2))],
            body: Box::new(Stmt::Provide {
                name: "a".to_string(),
                args: vec![Expr::int(5)],
                values: vec![Expr::int(1)],
            }),
        };
        assert!(matches!(
            execute(&stmt),
            Err(RuntimeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_undefined_scalar_is_reported() {
        let stmt = Stmt::Realize {
            name: "a".to_string(),
            bounds: vec![(Expr::int(0), Expr::int(2))],
            body: Box::new(Stmt::Provide {
                name: "a".to_string(),
                args: vec![Expr::int(0)],
                values: vec![Expr::var("missing")],
            }),
        };
        assert_eq!(
            execute(&stmt).unwrap_err(),
            RuntimeError::UndefinedVariable("missing".to_string())
        );
    }
}
