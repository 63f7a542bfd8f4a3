//! Auto-parallelization.
//!
//! A loop is parallelizable when no dependence is carried across its
//! iterations: every dependence whose endpoints both sit inside the
//! loop must compare `Equal` at the loop's schedule position. Such
//! loops are rewritten to `ForType::Parallel`; everything else is
//! rebuilt only when a nested loop changed.

use tracing::debug;

use crate::error::Error;
use crate::ir::{ForType, Stmt};
use crate::poly::dependence::Direction;
use crate::poly::Polytope;

/// Rewrite provably independent loops in `stmt` as parallel loops.
pub fn auto_parallelize(stmt: &Stmt, polytope: &Polytope) -> Result<Stmt, Error> {
    mutate(stmt, polytope)
}

/// Is every dependence carried with `loopvar` direction-`Equal` at
/// its schedule position?
pub(crate) fn can_parallelize(polytope: &Polytope, loopvar: &str) -> Result<bool, Error> {
    let mut ok = true;

    for dep in polytope.dependencies_involving(loopvar) {
        if dep.direction == Direction::Unknown {
            // Unanalyzable reference: nothing is known about the
            // carried distance, so the loop must stay sequential.
            ok = false;
            continue;
        }

        let source_pos = dep
            .source
            .schedule
            .position_of(loopvar)
            .ok_or_else(|| Error::LoopPositionMissing(loopvar.to_string()))?;
        let target_pos = dep
            .target
            .schedule
            .position_of(loopvar)
            .ok_or_else(|| Error::LoopPositionMissing(loopvar.to_string()))?;
        if source_pos != target_pos {
            return Err(Error::LoopPositionMismatch {
                var: loopvar.to_string(),
                source_pos,
                target_pos,
            });
        }

        if dep.directions.get(source_pos) != Some(&Direction::Equal) {
            ok = false;
        }
    }

    if ok {
        debug!(loopvar, "loop can be parallelized");
    } else {
        debug!(loopvar, "loop cannot be parallelized");
    }
    Ok(ok)
}

fn mutate(stmt: &Stmt, polytope: &Polytope) -> Result<Stmt, Error> {
    match stmt {
        Stmt::For {
            name,
            min,
            extent,
            for_type,
            device_api,
            body,
        } => {
            let new_body = mutate(body, polytope)?;
            let new_type = if can_parallelize(polytope, name)? {
                ForType::Parallel
            } else {
                *for_type
            };

            if new_type == *for_type && new_body == **body {
                Ok(stmt.clone())
            } else {
                Ok(Stmt::For {
                    name: name.clone(),
                    min: min.clone(),
                    extent: extent.clone(),
                    for_type: new_type,
                    device_api: *device_api,
                    body: Box::new(new_body),
                })
            }
        }

        Stmt::LetStmt { name, value, body } => {
            let new_body = mutate(body, polytope)?;
            if new_body == **body {
                Ok(stmt.clone())
            } else {
                Ok(Stmt::LetStmt {
                    name: name.clone(),
                    value: value.clone(),
                    body: Box::new(new_body),
                })
            }
        }

        Stmt::ProducerConsumer { name, body } => {
            let new_body = mutate(body, polytope)?;
            if new_body == **body {
                Ok(stmt.clone())
            } else {
                Ok(Stmt::ProducerConsumer {
                    name: name.clone(),
                    body: Box::new(new_body),
                })
            }
        }

        Stmt::Realize { name, bounds, body } => {
            let new_body = mutate(body, polytope)?;
            if new_body == **body {
                Ok(stmt.clone())
            } else {
                Ok(Stmt::Realize {
                    name: name.clone(),
                    bounds: bounds.clone(),
                    body: Box::new(new_body),
                })
            }
        }

        Stmt::Block(stmts) => {
            let mut changed = false;
            let mut out = Vec::with_capacity(stmts.len());
            for s in stmts {
                let new = mutate(s, polytope)?;
                changed |= new != *s;
                out.push(new);
            }
            if changed {
                Ok(Stmt::Block(out))
            } else {
                Ok(stmt.clone())
            }
        }

        Stmt::Provide { .. } => Ok(stmt.clone()),
    }
}
