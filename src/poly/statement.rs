//! One statement instance of the polytope model.

use std::fmt;
use std::rc::Rc;

use super::access::Access;
use super::domain::IterationDomain;
use super::schedule::Schedule;

/// The writes and reads that execute together at one schedule point.
#[derive(Debug, Clone)]
pub struct StmtInstance {
    pub domain: IterationDomain,
    pub schedule: Schedule,
    pub writes: Vec<Rc<Access>>,
    pub reads: Vec<Rc<Access>>,
}

impl StmtInstance {
    fn indent(&self) -> String {
        "  ".repeat(self.domain.len())
    }
}

impl fmt::Display for StmtInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = self.indent();

        write!(f, "{}  Iteration Sets := (", pad)?;
        for (i, level) in self.domain.levels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", level.var)?;
        }
        writeln!(f, ")")?;

        writeln!(f, "{}  Domain := {}", pad, self.domain)?;
        writeln!(f, "{}  Schedule := {}", pad, self.schedule)?;

        for (label, group) in [("Writes", &self.writes), ("Reads", &self.reads)] {
            if group.is_empty() {
                continue;
            }
            writeln!(f, "{}  {} :=", pad, label)?;
            for access in group {
                write!(f, "{}    {} := (", pad, access.name)?;
                crate::ir::display::write_list(f, &access.args)?;
                write!(f, ") : (")?;
                for (i, loopvar) in access.arg_loopvars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match loopvar {
                        Some(v) => write!(f, "{}", v)?,
                        None => write!(f, "0")?,
                    }
                }
                writeln!(f, ")")?;
            }
        }

        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Expr;
    use crate::poly::access::AccessKind;

    #[test]
    fn test_display_lists_writes_and_reads() {
        let mut domain = IterationDomain::default();
        domain.push_loop("x", &Expr::int(0), &Expr::int(10));
        let mut schedule = Schedule::new();
        schedule.open_loop("x");

        let write = Rc::new(Access::new(
            "c",
            AccessKind::Write,
            &[Expr::var("x")],
            &domain,
            &schedule,
        ));
        let read = Rc::new(Access::new(
            "a",
            AccessKind::Read,
            &[Expr::var("x") + Expr::int(1)],
            &domain,
            &schedule,
        ));

        let stmt = StmtInstance {
            domain,
            schedule,
            writes: vec![write],
            reads: vec![read],
        };
        let text = format!("{}", stmt);
        assert!(text.contains("Iteration Sets := (x)"));
        assert!(text.contains("Domain := [0, 9]"));
        assert!(text.contains("Schedule := (0, x, 0)"));
        assert!(text.contains("c := (x) : (x)"));
        assert!(text.contains("a := ((x + 1)) : (x)"));
    }
}
