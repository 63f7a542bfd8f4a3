//! Occurrence counting for named variables.
//!
//! Counts how often a name is mentioned by an expression, chasing
//! bindings: when a visited variable is itself bound in the ambient
//! scope, the traversal descends into the bound value instead of
//! counting the alias. `Select` guards are only inspected when
//! `visit_guard` is set, so callers can ask about the data path alone.

use super::scope::Scope;
use super::Expr;

/// Count occurrences of `name` in `expr`, resolving bindings through
/// `scope`.
pub fn count_occurrences(
    expr: &Expr,
    name: &str,
    scope: &mut Scope<Expr>,
    visit_guard: bool,
) -> usize {
    match expr {
        Expr::IntImm(_) => 0,
        Expr::Variable { name: vn, .. } => {
            if vn == name {
                1
            } else if scope.contains(vn) {
                // Chase the binding as if it had been substituted.
                let bound = scope.get(vn).cloned();
                match bound {
                    Some(value) => count_occurrences(&value, name, scope, visit_guard),
                    None => 0,
                }
            } else {
                0
            }
        }
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
            count_occurrences(a, name, scope, visit_guard)
                + count_occurrences(b, name, scope, visit_guard)
        }
        Expr::Let {
            name: bound,
            value,
            body,
        } => {
            scope.push(bound.clone(), (**value).clone());
            let count = count_occurrences(body, name, scope, visit_guard);
            scope.pop(bound);
            count
        }
        Expr::Select {
            condition,
            true_value,
            false_value,
        } => {
            let mut count = 0;
            if visit_guard {
                count += count_occurrences(condition, name, scope, visit_guard);
            }
            count += count_occurrences(true_value, name, scope, visit_guard);
            count + count_occurrences(false_value, name, scope, visit_guard)
        }
        Expr::Call { args, .. } => args
            .iter()
            .map(|a| count_occurrences(a, name, scope, visit_guard))
            .sum(),
    }
}

/// True iff `name` occurs in `expr` (guards included).
pub fn find_occurrence(expr: &Expr, name: &str) -> bool {
    let mut scope = Scope::new();
    count_occurrences(expr, name, &mut scope, true) > 0
}
