//! Lumen mid-end: polyhedral dependence analysis and loop
//! auto-parallelization over the lowered pipeline IR.
//!
//! The flow is `Stmt` → [`Polytope::analyze`] → [`auto_parallelize`]:
//! the analyzer captures every array reference with its iteration
//! domain and lexicographic schedule and derives dependence direction
//! vectors; the pass then marks every loop that carries no dependence
//! as parallel. [`optimize`] wires the two together behind the
//! `ApplyPolyhedralModel` target feature.

pub mod error;
pub mod ir;
pub mod passes;
pub mod pipelines;
pub mod poly;
pub mod runtime;
pub mod target;

pub use error::Error;
pub use passes::parallelize::auto_parallelize;
pub use poly::Polytope;
pub use target::{Feature, Target};

use ir::Stmt;

/// Run the mid-end passes requested by `target`.
///
/// Without `ApplyPolyhedralModel` the input is returned unchanged.
pub fn optimize(stmt: &Stmt, target: &Target) -> Result<Stmt, Error> {
    if !target.has_feature(Feature::ApplyPolyhedralModel) {
        return Ok(stmt.clone());
    }

    let polytope = Polytope::analyze(stmt)?;
    if target.has_feature(Feature::DumpPolytope) {
        eprintln!("{}", polytope);
    }
    auto_parallelize(stmt, &polytope)
}
