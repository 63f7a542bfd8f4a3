//! Single-pass construction of the polytope model from the IR.
//!
//! The builder walks the statement tree once, tracking the open loop
//! nest (domain + schedule) and the producer regions it is inside.
//! Array references are captured as they are encountered. A statement
//! instance is emitted, and the schedule's innermost counter bumped,
//! exactly when a unit of work completes: a `Provide`, or a `LetStmt`
//! whose bound value performed reads.

use std::collections::BTreeSet;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::Error;
use crate::ir::{Expr, Stmt};

use super::access::{Access, AccessKind};
use super::domain::IterationDomain;
use super::schedule::Schedule;
use super::statement::StmtInstance;

pub(crate) struct Builder {
    pub(crate) accesses: Vec<Rc<Access>>,
    pub(crate) statements: Vec<StmtInstance>,

    /// Are we inside a `ProducerConsumer` region? Starts `[false]` so
    /// the top entry is always present.
    pub(crate) in_region: Vec<bool>,
    /// Arrays whose producer region has been entered. Reads and
    /// writes of other names (pipeline inputs, scratch) are opaque.
    pub(crate) analyzable: BTreeSet<String>,
    pub(crate) domain: IterationDomain,
    pub(crate) schedule: Schedule,
    /// Writes and reads accumulated for the statement being formed.
    pub(crate) open_writes: Vec<Rc<Access>>,
    pub(crate) open_reads: Vec<Rc<Access>>,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Self {
            accesses: Vec::new(),
            statements: Vec::new(),
            in_region: vec![false],
            analyzable: BTreeSet::new(),
            domain: IterationDomain::default(),
            schedule: Schedule::new(),
            open_writes: Vec::new(),
            open_reads: Vec::new(),
        }
    }

    pub(crate) fn build(
        mut self,
        stmt: &Stmt,
    ) -> Result<(Vec<Rc<Access>>, Vec<StmtInstance>), Error> {
        self.visit_stmt(stmt)?;

        debug_assert!(self.domain.is_empty());
        debug_assert_eq!(self.schedule.len(), 1);
        debug_assert_eq!(self.in_region, vec![false]);
        debug_assert!(self.open_writes.is_empty() && self.open_reads.is_empty());

        Ok((self.accesses, self.statements))
    }

    fn inside_region(&self) -> bool {
        self.in_region.last().copied().unwrap_or(false)
    }

    /// Bundle the accumulated accesses into a statement instance and
    /// move the schedule past it.
    fn emit_statement(&mut self) {
        let stmt = StmtInstance {
            domain: self.domain.clone(),
            schedule: self.schedule.clone(),
            writes: std::mem::take(&mut self.open_writes),
            reads: std::mem::take(&mut self.open_reads),
        };
        debug!(schedule = %stmt.schedule, writes = stmt.writes.len(), reads = stmt.reads.len(),
               "statement instance");
        self.statements.push(stmt);
        self.schedule.advance_statement();
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<(), Error> {
        match stmt {
            Stmt::Realize { bounds, body, .. } => {
                for (min, extent) in bounds {
                    self.visit_expr(min);
                    self.visit_expr(extent);
                }
                self.visit_stmt(body)
            }

            Stmt::ProducerConsumer { name, body } => {
                debug!(region = %name, "entering producer region");
                self.in_region.push(true);
                self.analyzable.insert(name.clone());
                self.visit_stmt(body)?;
                self.in_region.pop();
                Ok(())
            }

            Stmt::For {
                name, min, extent, body, ..
            } => {
                if !self.inside_region() {
                    self.visit_expr(min);
                    self.visit_expr(extent);
                    return self.visit_stmt(body);
                }

                self.domain.push_loop(name, min, extent);
                self.schedule.open_loop(name);
                self.visit_expr(min);
                self.visit_expr(extent);
                self.visit_stmt(body)?;
                self.schedule.close_loop(name)?;
                self.domain.pop_loop(name)
            }

            Stmt::LetStmt { name, value, body } => {
                if !self.inside_region() {
                    self.visit_expr(value);
                    return self.visit_stmt(body);
                }

                self.visit_expr(value);

                // A binding's value is pure: it may read, never write.
                if !self.open_writes.is_empty() {
                    return Err(Error::WriteUnderLet(name.clone()));
                }
                if !self.open_reads.is_empty() {
                    self.emit_statement();
                }
                self.visit_stmt(body)
            }

            Stmt::Provide { name, args, values } => {
                for v in values {
                    self.visit_expr(v);
                }
                for a in args {
                    self.visit_expr(a);
                }

                if self.inside_region() && self.analyzable.contains(name) {
                    let write = Rc::new(Access::new(
                        name,
                        AccessKind::Write,
                        args,
                        &self.domain,
                        &self.schedule,
                    ));
                    trace!(array = %name, schedule = %self.schedule, "write reference");
                    self.accesses.push(Rc::clone(&write));
                    self.open_writes.push(write);
                }

                if !self.open_writes.is_empty() || !self.open_reads.is_empty() {
                    self.emit_statement();
                }
                Ok(())
            }

            Stmt::Block(stmts) => {
                for s in stmts {
                    self.visit_stmt(s)?;
                }
                Ok(())
            }
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::IntImm(_) | Expr::Variable { .. } => {}
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
                self.visit_expr(a);
                self.visit_expr(b);
            }
            Expr::Let { value, body, .. } => {
                self.visit_expr(value);
                self.visit_expr(body);
            }
            Expr::Select {
                condition,
                true_value,
                false_value,
            } => {
                self.visit_expr(condition);
                self.visit_expr(true_value);
                self.visit_expr(false_value);
            }
            Expr::Call { name, args } => {
                for a in args {
                    self.visit_expr(a);
                }
                if self.inside_region() && self.analyzable.contains(name) {
                    let read = Rc::new(Access::new(
                        name,
                        AccessKind::Read,
                        args,
                        &self.domain,
                        &self.schedule,
                    ));
                    trace!(array = %name, schedule = %self.schedule, "read reference");
                    self.accesses.push(Rc::clone(&read));
                    self.open_reads.push(read);
                }
            }
        }
    }
}
