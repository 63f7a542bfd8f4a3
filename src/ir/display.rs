//! Human-readable IR rendering. Diagnostic output only; the format
//! is not stable.

use std::fmt;

use super::{DeviceApi, Expr, ForType, Stmt};

impl fmt::Display for ForType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForType::Serial => write!(f, "for"),
            ForType::Parallel => write!(f, "parallel"),
            ForType::Vectorized => write!(f, "vectorized"),
            ForType::Unrolled => write!(f, "unrolled"),
        }
    }
}

impl fmt::Display for DeviceApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceApi::None => write!(f, "none"),
            DeviceApi::Host => write!(f, "host"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntImm(v) => write!(f, "{}", v),
            Expr::Variable { name, .. } => write!(f, "{}", name),
            Expr::Add(a, b) => write!(f, "({} + {})", a, b),
            Expr::Sub(a, b) => write!(f, "({} - {})", a, b),
            Expr::Mul(a, b) => write!(f, "({}*{})", a, b),
            Expr::Let { name, value, body } => {
                write!(f, "(let {} = {} in {})", name, value, body)
            }
            Expr::Select {
                condition,
                true_value,
                false_value,
            } => write!(f, "select({}, {}, {})", condition, true_value, false_value),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

/// Comma-separated expression list.
pub(crate) fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", e)?;
    }
    Ok(())
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    match stmt {
        Stmt::Provide { name, args, values } => {
            write!(f, "{}{}(", pad, name)?;
            write_list(f, args)?;
            write!(f, ") = ")?;
            write_list(f, values)?;
            writeln!(f)
        }
        Stmt::For {
            name,
            min,
            extent,
            for_type,
            body,
            ..
        } => {
            writeln!(f, "{}{} ({}, {}, {}) {{", pad, for_type, name, min, extent)?;
            write_stmt(f, body, depth + 1)?;
            writeln!(f, "{}}}", pad)
        }
        Stmt::LetStmt { name, value, body } => {
            writeln!(f, "{}let {} = {}", pad, name, value)?;
            write_stmt(f, body, depth)
        }
        Stmt::ProducerConsumer { name, body } => {
            writeln!(f, "{}produce {} {{", pad, name)?;
            write_stmt(f, body, depth + 1)?;
            writeln!(f, "{}}}", pad)
        }
        Stmt::Realize { name, bounds, body } => {
            write!(f, "{}realize {}(", pad, name)?;
            for (i, (min, extent)) in bounds.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "[{}, {}]", min, extent)?;
            }
            writeln!(f, ") {{")?;
            write_stmt(f, body, depth + 1)?;
            writeln!(f, "{}}}", pad)
        }
        Stmt::Block(stmts) => {
            for s in stmts {
                write_stmt(f, s, depth)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_display() {
        let e = Expr::var("i") + Expr::int(3);
        assert_eq!(format!("{}", e), "(i + 3)");

        let e = Expr::call("a", vec![Expr::var("i"), Expr::var("j")]);
        assert_eq!(format!("{}", e), "a(i, j)");

        let e = Expr::var("i") * Expr::var("i");
        assert_eq!(format!("{}", e), "(i*i)");
    }

    #[test]
    fn test_select_display() {
        let e = Expr::Select {
            condition: Box::new(Expr::var("c")),
            true_value: Box::new(Expr::int(1)),
            false_value: Box::new(Expr::int(0)),
        };
        assert_eq!(format!("{}", e), "select(c, 1, 0)");
    }

    #[test]
    fn test_stmt_display_nests() {
        let s = Stmt::For {
            name: "x".to_string(),
            min: Expr::int(0),
            extent: Expr::int(10),
            for_type: ForType::Parallel,
            device_api: DeviceApi::None,
            body: Box::new(Stmt::Provide {
                name: "a".to_string(),
                args: vec![Expr::var("x")],
                values: vec![Expr::var("x")],
            }),
        };
        let text = format!("{}", s);
        assert!(text.starts_with("parallel (x, 0, 10) {"));
        assert!(text.contains("  a(x) = x"));
    }
}
