//! One array reference: a single read or write site.

use tracing::trace;

use crate::ir::simplify::simplify;
use crate::ir::substitute::substitute;
use crate::ir::vars::find_occurrence;
use crate::ir::Expr;

use super::domain::IterationDomain;
use super::schedule::Schedule;

/// Whether the reference stores to or loads from its array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Write,
    Read,
}

/// One occurrence of an array read or write inside the analyzed
/// region, frozen at its capture point: the subscript expressions
/// plus snapshots of the enclosing domain and schedule.
///
/// Each subscript is decomposed on construction: a subscript that
/// mentions exactly one enclosing loop counter splits into that
/// counter plus a constant remainder (the `v + c` form the dependence
/// test understands). A subscript mentioning two or more counter
/// occurrences makes the whole reference non-affine.
#[derive(Debug, Clone, PartialEq)]
pub struct Access {
    pub name: String,
    pub kind: AccessKind,
    pub args: Vec<Expr>,
    pub domain: IterationDomain,
    pub schedule: Schedule,

    /// All subscripts are affine in at most one loop counter each.
    pub args_affine: bool,
    /// Per subscript: the single enclosing loop counter it mentions.
    pub arg_loopvars: Vec<Option<String>>,
    /// Per subscript: the subscript with that counter zeroed out.
    pub arg_remainders: Vec<Expr>,
}

impl Access {
    pub fn new(
        name: &str,
        kind: AccessKind,
        args: &[Expr],
        domain: &IterationDomain,
        schedule: &Schedule,
    ) -> Self {
        let mut access = Self {
            name: name.to_string(),
            kind,
            args: args.to_vec(),
            domain: domain.clone(),
            schedule: schedule.clone(),
            args_affine: true,
            arg_loopvars: Vec::with_capacity(args.len()),
            arg_remainders: Vec::with_capacity(args.len()),
        };
        access.derive_args();
        access
    }

    /// Classify every subscript against the enclosing loop counters.
    fn derive_args(&mut self) {
        for arg in &self.args {
            let mut found = Vec::new();
            collect_domain_vars(arg, &self.domain, &mut found);

            match found.as_slice() {
                [] => {
                    self.arg_loopvars.push(None);
                    self.arg_remainders.push(arg.clone());
                }
                [var] => {
                    let remainder = simplify(&substitute(var, &Expr::int(0), arg));
                    self.arg_loopvars.push(Some(var.clone()));
                    self.arg_remainders.push(remainder);
                }
                _ => {
                    // Two or more counter occurrences: not `v + c`.
                    trace!(name = %self.name, subscript = %arg, "non-affine subscript");
                    self.args_affine = false;
                    self.arg_loopvars.push(None);
                    self.arg_remainders.push(arg.clone());
                }
            }
        }
    }

    /// May this reference touch the same element as another reference
    /// at the same schedule point?
    pub fn overlaps(&self) -> bool {
        // A counter missing from the schedule leaves a whole range of
        // instances sharing one schedule point: overlapping for sure.
        for level in &self.domain.levels {
            let pinned = self
                .schedule
                .entries()
                .iter()
                .any(|e| find_occurrence(e, &level.var));
            if !pinned {
                return true;
            }
        }

        // Every counter is pinned. Telling disjoint subscripts apart
        // at the same point would need a subscript comparison this
        // model does not carry; assume overlap.
        true
    }
}

/// Append every occurrence of an enclosing loop counter in `expr`, in
/// traversal order. Duplicates are kept on purpose: `i*i` must count
/// as two finds, not one variable.
fn collect_domain_vars(expr: &Expr, domain: &IterationDomain, found: &mut Vec<String>) {
    match expr {
        Expr::IntImm(_) => {}
        Expr::Variable { name, .. } => {
            if domain.contains(name) {
                found.push(name.clone());
            }
        }
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
            collect_domain_vars(a, domain, found);
            collect_domain_vars(b, domain, found);
        }
        Expr::Let { value, body, .. } => {
            collect_domain_vars(value, domain, found);
            collect_domain_vars(body, domain, found);
        }
        Expr::Select {
            condition,
            true_value,
            false_value,
        } => {
            collect_domain_vars(condition, domain, found);
            collect_domain_vars(true_value, domain, found);
            collect_domain_vars(false_value, domain, found);
        }
        Expr::Call { args, .. } => {
            for a in args {
                collect_domain_vars(a, domain, found);
            }
        }
    }
}
