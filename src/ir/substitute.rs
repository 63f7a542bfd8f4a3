//! Variable substitution over expressions.

use std::collections::HashMap;

use super::Expr;

/// Replace every free occurrence of `name` with `replacement`.
pub fn substitute(name: &str, replacement: &Expr, expr: &Expr) -> Expr {
    let mut map = HashMap::new();
    map.insert(name.to_string(), replacement.clone());
    substitute_all(&map, expr)
}

/// Simultaneously replace every free occurrence of each mapped name.
pub fn substitute_all(map: &HashMap<String, Expr>, expr: &Expr) -> Expr {
    match expr {
        Expr::IntImm(_) => expr.clone(),
        Expr::Variable { name, .. } => match map.get(name) {
            Some(replacement) => replacement.clone(),
            None => expr.clone(),
        },
        Expr::Add(a, b) => substitute_all(map, a) + substitute_all(map, b),
        Expr::Sub(a, b) => substitute_all(map, a) - substitute_all(map, b),
        Expr::Mul(a, b) => substitute_all(map, a) * substitute_all(map, b),
        Expr::Let { name, value, body } => {
            // The binding shadows an outer name inside its body.
            let body = if map.contains_key(name) {
                let mut inner = map.clone();
                inner.remove(name);
                substitute_all(&inner, body)
            } else {
                substitute_all(map, body)
            };
            Expr::Let {
                name: name.clone(),
                value: Box::new(substitute_all(map, value)),
                body: Box::new(body),
            }
        }
        Expr::Select {
            condition,
            true_value,
            false_value,
        } => Expr::Select {
            condition: Box::new(substitute_all(map, condition)),
            true_value: Box::new(substitute_all(map, true_value)),
            false_value: Box::new(substitute_all(map, false_value)),
        },
        Expr::Call { name, args } => Expr::Call {
            name: name.clone(),
            args: args.iter().map(|a| substitute_all(map, a)).collect(),
        },
    }
}
