//! Dependence computation between two references of the same array.
//!
//! Given a write `a` and another reference `b`, the test re-expresses
//! `a`'s schedule in `b`'s iteration coordinates (via the subscript
//! equations `a.args[i] == b.args[i]`) and compares the two schedules
//! position by position. The resulting direction vector says, for
//! every common loop level, whether the aliasing source instance runs
//! earlier (`Less`), at the same point (`Equal`), later (`Greater`),
//! or at a statically unknown offset (`Unknown`).

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::Error;
use crate::ir::simplify::{as_const_int, simplify};
use crate::ir::substitute::substitute_all;
use crate::ir::Expr;

use super::access::{Access, AccessKind};
use super::schedule::Schedule;

/// Per-schedule-position comparison of two instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Equal,
    Less,
    Greater,
    Unknown,
}

impl Direction {
    fn flipped(self) -> Direction {
        match self {
            Direction::Less => Direction::Greater,
            Direction::Greater => Direction::Less,
            other => other,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Equal => write!(f, "="),
            Direction::Less => write!(f, "-"),
            Direction::Greater => write!(f, "+"),
            Direction::Unknown => write!(f, "*"),
        }
    }
}

/// Dependence classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependenceKind {
    /// Write before read.
    Flow,
    /// Read before write.
    Anti,
    /// Write before write.
    Output,
    /// Same instance, no ordering constraint.
    None,
    /// At least one end is not analyzable.
    Unknown,
}

impl fmt::Display for DependenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependenceKind::Flow => write!(f, "Flow"),
            DependenceKind::Anti => write!(f, "Anti"),
            DependenceKind::Output => write!(f, "Output"),
            DependenceKind::None => write!(f, "None"),
            DependenceKind::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A computed dependence edge, oriented source-before-target.
#[derive(Debug, Clone)]
pub struct Dependence {
    pub source: Rc<Access>,
    pub target: Rc<Access>,

    /// Per subscript: the target-coordinate expression equated with
    /// the source's loop counter.
    pub iter_replacement: Vec<Expr>,
    /// The source schedule re-expressed in target coordinates.
    pub replaced_schedule: Schedule,
    /// Aggregate direction: the first non-`Equal` entry.
    pub direction: Direction,
    /// Direction per common schedule position.
    pub directions: Vec<Direction>,
    pub kind: DependenceKind,
}

impl Dependence {
    /// Compute the dependence for an ordered pair where `a` is a
    /// write. `b` may be a read or a later write of the same array.
    pub(crate) fn new(a: Rc<Access>, b: Rc<Access>) -> Result<Self, Error> {
        if !a.args_affine || !b.args_affine {
            let replaced_schedule = a.schedule.clone();
            debug!(array = %a.name, "dependence with non-affine reference is unknown");
            return Ok(Self {
                source: a,
                target: b,
                iter_replacement: Vec::new(),
                replaced_schedule,
                direction: Direction::Unknown,
                directions: Vec::new(),
                kind: DependenceKind::Unknown,
            });
        }

        let mut dep = Self {
            iter_replacement: Vec::new(),
            replaced_schedule: a.schedule.clone(),
            direction: Direction::Equal,
            directions: Vec::new(),
            kind: DependenceKind::None,
            source: a,
            target: b,
        };

        dep.compute_iter_replacement();
        dep.compute_directions()?;
        dep.orient_forward();
        dep.kind = dep.classify();

        debug!(kind = %dep.kind, array = %dep.source.name, direction = ?dep.direction,
               "dependence");
        Ok(dep)
    }

    /// Equate subscripts: solving `v + c == b.args[i]` for the source
    /// counter `v` gives `v = b.args[i] - c`. Substituting that into
    /// the source schedule expresses it in target coordinates.
    fn compute_iter_replacement(&mut self) {
        let mut replacements: HashMap<String, Expr> = HashMap::new();

        let arity = self.source.args.len().min(self.target.args.len());
        for i in 0..arity {
            let b_arg = &self.target.args[i];
            let replacement = simplify(&(b_arg.clone() - self.source.arg_remainders[i].clone()));
            if let Some(var) = &self.source.arg_loopvars[i] {
                replacements.insert(var.clone(), replacement.clone());
            }
            self.iter_replacement.push(replacement);
        }

        self.replaced_schedule = self
            .source
            .schedule
            .map_entries(|e| substitute_all(&replacements, e));
    }

    /// Compare the replaced source schedule against the target
    /// schedule, outermost position first.
    fn compute_directions(&mut self) -> Result<(), Error> {
        let a = self.replaced_schedule.entries();
        let b = self.target.schedule.entries();
        let common = a.len().min(b.len());

        self.direction = Direction::Equal;
        self.directions = Vec::with_capacity(common);

        for i in 0..common {
            let d = compare_positions(&a[i], &b[i]);
            self.directions.push(d);
            if self.direction == Direction::Equal {
                self.direction = d;
            }
        }

        if self.direction == Direction::Equal {
            // Instances at the same schedule point must come from the
            // same loop nest.
            if a.len() != b.len() {
                return Err(Error::ScheduleLengthMismatch {
                    source_len: a.len(),
                    target_len: b.len(),
                });
            }

            if self.source.overlaps() || self.target.overlaps() {
                // The accesses may alias at the same point: record the
                // recurrence as carried by the innermost loop, so only
                // that loop stays sequential.
                match innermost_loop_position(&self.target.schedule) {
                    Some(pos) => {
                        self.directions[pos] = Direction::Less;
                        self.direction = Direction::Less;
                    }
                    None => {
                        // Loop-free straight-line pair: fall back to a
                        // backward edge, reoriented below.
                        self.direction = Direction::Greater;
                    }
                }
            }
        }
        Ok(())
    }

    /// Make the edge point forward in program order.
    fn orient_forward(&mut self) {
        if self.direction == Direction::Greater {
            std::mem::swap(&mut self.source, &mut self.target);
            for d in &mut self.directions {
                *d = d.flipped();
            }
            self.direction = self.direction.flipped();
        } else if self.direction == Direction::Equal
            && self.source.kind == AccessKind::Write
            && self.target.kind == AccessKind::Read
        {
            // Reflexive same-point pair with no overlap: keep the read
            // as the source so the write labels the later instance.
            std::mem::swap(&mut self.source, &mut self.target);
        }
    }

    fn classify(&self) -> DependenceKind {
        match (self.direction, self.source.kind, self.target.kind) {
            (Direction::Unknown, _, _) => DependenceKind::Unknown,
            (Direction::Equal, _, _) => DependenceKind::None,
            (_, AccessKind::Write, AccessKind::Read) => DependenceKind::Flow,
            (_, AccessKind::Read, AccessKind::Write) => DependenceKind::Anti,
            (_, AccessKind::Write, AccessKind::Write) => DependenceKind::Output,
            // Read/read pairs are never enumerated; conservative if
            // one ever appears.
            (_, AccessKind::Read, AccessKind::Read) => DependenceKind::Unknown,
        }
    }
}

/// Sign of `b - a` at one schedule position.
fn compare_positions(a: &Expr, b: &Expr) -> Direction {
    let diff = simplify(&(b.clone() - a.clone()));
    match as_const_int(&diff) {
        None => Direction::Unknown,
        Some(d) if d > 0 => Direction::Less,
        Some(d) if d < 0 => Direction::Greater,
        Some(_) => Direction::Equal,
    }
}

/// Position of the innermost loop counter in a schedule.
fn innermost_loop_position(schedule: &Schedule) -> Option<usize> {
    schedule
        .entries()
        .iter()
        .rposition(|e| e.as_variable().is_some())
}

impl fmt::Display for Dependence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}(", self.kind, self.source.name)?;
        crate::ir::display::write_list(f, &self.source.args)?;
        write!(f, ") -> {}(", self.target.name)?;
        crate::ir::display::write_list(f, &self.target.args)?;
        write!(f, ") : (")?;
        for (i, d) in self.directions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        writeln!(f, ")")
    }
}
