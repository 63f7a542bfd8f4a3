//! The polytope model of an analyzed pipeline region.
//!
//! `Polytope::analyze` walks a lowered statement tree, captures every
//! read and write of the realized arrays together with its iteration
//! domain and lexicographic schedule, then computes the pairwise
//! dependence edges. The auto-parallelization pass consumes the
//! result through `dependencies_involving`.

pub mod access;
pub mod builder;
pub mod dependence;
pub mod domain;
pub mod report;
pub mod schedule;
pub mod statement;
#[cfg(test)]
mod tests;

use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::ir::Stmt;

use self::access::{Access, AccessKind};
use self::builder::Builder;
use self::dependence::Dependence;
use self::statement::StmtInstance;

/// All references, statement instances, and dependences of one
/// analyzed region. The references are owned here; statements and
/// dependences hold shared read-only handles into the same arena.
#[derive(Debug, Clone, Default)]
pub struct Polytope {
    accesses: Vec<Rc<Access>>,
    statements: Vec<StmtInstance>,
    dependences: Vec<Rc<Dependence>>,
}

impl Polytope {
    /// Build the model for `stmt` and compute all dependences.
    pub fn analyze(stmt: &Stmt) -> Result<Self, Error> {
        let (accesses, statements) = Builder::new().build(stmt)?;
        let mut polytope = Self {
            accesses,
            statements,
            dependences: Vec::new(),
        };
        polytope.compute_dependences()?;
        Ok(polytope)
    }

    /// Enumerate ordered same-array pairs with a write on the left.
    /// Write/write pairs are deduplicated by keeping the
    /// program-order orientation only.
    fn compute_dependences(&mut self) -> Result<(), Error> {
        for (i, a) in self.accesses.iter().enumerate() {
            if a.kind == AccessKind::Read {
                continue;
            }

            for (j, b) in self.accesses.iter().enumerate() {
                if i == j || a.name != b.name {
                    continue;
                }
                if b.kind == AccessKind::Write && i > j {
                    continue;
                }

                let dep = Dependence::new(Rc::clone(a), Rc::clone(b))?;
                self.dependences.push(Rc::new(dep));
            }
        }
        Ok(())
    }

    pub fn accesses(&self) -> &[Rc<Access>] {
        &self.accesses
    }

    pub fn statements(&self) -> &[StmtInstance] {
        &self.statements
    }

    pub fn dependences(&self) -> &[Rc<Dependence>] {
        &self.dependences
    }

    /// Dependences whose both endpoints iterate over `loopvar`.
    pub fn dependencies_involving(&self, loopvar: &str) -> Vec<Rc<Dependence>> {
        self.dependences
            .iter()
            .filter(|dep| {
                dep.source.domain.contains(loopvar) && dep.target.domain.contains(loopvar)
            })
            .cloned()
            .collect()
    }
}

impl fmt::Display for Polytope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        for dep in &self.dependences {
            write!(f, "{}", dep)?;
        }
        Ok(())
    }
}
