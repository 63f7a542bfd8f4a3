//! Expression simplifier.
//!
//! A partial evaluator, not a full algebraic rewriter: affine
//! expressions are normalized by collecting them into a linear
//! combination of variables plus a constant, so differences of
//! schedule coordinates like `r - (r - 2)` fold all the way down to a
//! literal. Anything non-affine (products of variables, selects,
//! array reads) is left structurally intact with simplified children.

use std::collections::BTreeMap;

use super::Expr;

/// Simplify an expression.
pub fn simplify(expr: &Expr) -> Expr {
    if let Some((terms, constant)) = linearize(expr) {
        return rebuild(terms, constant);
    }

    match expr {
        Expr::IntImm(_) | Expr::Variable { .. } => expr.clone(),
        Expr::Add(a, b) => fold_binop(&simplify(a), &simplify(b), Op::Add),
        Expr::Sub(a, b) => fold_binop(&simplify(a), &simplify(b), Op::Sub),
        Expr::Mul(a, b) => fold_binop(&simplify(a), &simplify(b), Op::Mul),
        Expr::Let { name, value, body } => Expr::Let {
            name: name.clone(),
            value: Box::new(simplify(value)),
            body: Box::new(simplify(body)),
        },
        Expr::Select {
            condition,
            true_value,
            false_value,
        } => Expr::Select {
            condition: Box::new(simplify(condition)),
            true_value: Box::new(simplify(true_value)),
            false_value: Box::new(simplify(false_value)),
        },
        Expr::Call { name, args } => Expr::Call {
            name: name.clone(),
            args: args.iter().map(simplify).collect(),
        },
    }
}

/// The constant value of an expression, if it is a literal.
pub fn as_const_int(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::IntImm(v) => Some(*v),
        _ => None,
    }
}

enum Op {
    Add,
    Sub,
    Mul,
}

fn fold_binop(a: &Expr, b: &Expr, op: Op) -> Expr {
    if let (Expr::IntImm(x), Expr::IntImm(y)) = (a, b) {
        return Expr::IntImm(match op {
            Op::Add => x.wrapping_add(*y),
            Op::Sub => x.wrapping_sub(*y),
            Op::Mul => x.wrapping_mul(*y),
        });
    }
    match op {
        Op::Add => a.clone() + b.clone(),
        Op::Sub => a.clone() - b.clone(),
        Op::Mul => a.clone() * b.clone(),
    }
}

/// Collect `expr` into `constant + sum(coeff * var)`. Returns `None`
/// for anything that is not affine in its variables.
fn linearize(expr: &Expr) -> Option<(BTreeMap<String, i64>, i64)> {
    match expr {
        Expr::IntImm(v) => Some((BTreeMap::new(), *v)),
        Expr::Variable { name, .. } => {
            let mut terms = BTreeMap::new();
            terms.insert(name.clone(), 1);
            Some((terms, 0))
        }
        Expr::Add(a, b) => Some(combine(linearize(a)?, linearize(b)?, 1)),
        Expr::Sub(a, b) => Some(combine(linearize(a)?, linearize(b)?, -1)),
        Expr::Mul(a, b) => {
            let (ta, ca) = linearize(a)?;
            let (tb, cb) = linearize(b)?;
            if ta.is_empty() {
                Some((scale(tb, ca), cb.wrapping_mul(ca)))
            } else if tb.is_empty() {
                Some((scale(ta, cb), ca.wrapping_mul(cb)))
            } else {
                None
            }
        }
        Expr::Let { .. } | Expr::Select { .. } | Expr::Call { .. } => None,
    }
}

fn combine(
    (mut terms, ca): (BTreeMap<String, i64>, i64),
    (other, cb): (BTreeMap<String, i64>, i64),
    sign: i64,
) -> (BTreeMap<String, i64>, i64) {
    for (name, coeff) in other {
        *terms.entry(name).or_insert(0) += sign * coeff;
    }
    (terms, ca.wrapping_add(sign.wrapping_mul(cb)))
}

fn scale(terms: BTreeMap<String, i64>, factor: i64) -> BTreeMap<String, i64> {
    terms
        .into_iter()
        .map(|(name, coeff)| (name, coeff.wrapping_mul(factor)))
        .collect()
}

/// Rebuild a normalized expression from collected terms. Variables
/// come out in name order, so equal linear combinations rebuild to
/// structurally equal expressions.
fn rebuild(terms: BTreeMap<String, i64>, constant: i64) -> Expr {
    let mut acc: Option<Expr> = None;

    for (name, coeff) in terms {
        if coeff == 0 {
            continue;
        }
        let var = Expr::var(name);
        acc = Some(match (acc, coeff) {
            (None, 1) => var,
            (None, c) => Expr::int(c) * var,
            (Some(a), 1) => a + var,
            (Some(a), -1) => a - var,
            (Some(a), c) if c < 0 => a - (Expr::int(-c) * var),
            (Some(a), c) => a + (Expr::int(c) * var),
        });
    }

    match acc {
        None => Expr::int(constant),
        Some(a) if constant > 0 => a + Expr::int(constant),
        Some(a) if constant < 0 => a - Expr::int(-constant),
        Some(a) => a,
    }
}
