//! Machine-readable summary of an analysis, for tooling.

use serde::Serialize;

use crate::error::Error;
use crate::ir::Stmt;
use crate::passes::parallelize::can_parallelize;

use super::access::{Access, AccessKind};
use super::Polytope;

#[derive(Debug, Clone, Serialize)]
pub struct AccessSummary {
    pub array: String,
    pub kind: String,
    pub subscripts: Vec<String>,
}

impl AccessSummary {
    fn of(access: &Access) -> Self {
        Self {
            array: access.name.clone(),
            kind: match access.kind {
                AccessKind::Write => "write".to_string(),
                AccessKind::Read => "read".to_string(),
            },
            subscripts: access.args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DependenceSummary {
    pub kind: String,
    pub source: AccessSummary,
    pub target: AccessSummary,
    pub direction: String,
    pub directions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoopSummary {
    pub var: String,
    pub parallel: bool,
}

/// Everything `lumen model --json` prints.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub dependences: Vec<DependenceSummary>,
    pub loops: Vec<LoopSummary>,
}

/// Summarize the dependences of `polytope` and the per-loop verdicts
/// for every loop appearing in `stmt`.
pub fn model_report(stmt: &Stmt, polytope: &Polytope) -> Result<ModelReport, Error> {
    let dependences = polytope
        .dependences()
        .iter()
        .map(|dep| DependenceSummary {
            kind: dep.kind.to_string(),
            source: AccessSummary::of(&dep.source),
            target: AccessSummary::of(&dep.target),
            direction: format!("{:?}", dep.direction),
            directions: dep.directions.iter().map(|d| format!("{:?}", d)).collect(),
        })
        .collect();

    let mut loops = Vec::new();
    collect_loops(stmt, &mut loops);
    let loops = loops
        .into_iter()
        .map(|var| {
            can_parallelize(polytope, &var).map(|parallel| LoopSummary { var, parallel })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(ModelReport { dependences, loops })
}

/// Loop variables of `stmt` in traversal order, deduplicated.
fn collect_loops(stmt: &Stmt, out: &mut Vec<String>) {
    match stmt {
        Stmt::For { name, body, .. } => {
            if !out.iter().any(|v| v == name) {
                out.push(name.clone());
            }
            collect_loops(body, out);
        }
        Stmt::LetStmt { body, .. }
        | Stmt::ProducerConsumer { body, .. }
        | Stmt::Realize { body, .. } => collect_loops(body, out),
        Stmt::Block(stmts) => {
            for s in stmts {
                collect_loops(s, out);
            }
        }
        Stmt::Provide { .. } => {}
    }
}
