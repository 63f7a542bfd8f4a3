//! Mid-end errors.
//!
//! Every variant is a structural precondition violation: the input
//! tree (or the analyzer's own bookkeeping) broke an invariant the
//! traversal relies on. There is no recovery: callers surface the
//! error and keep the input IR unchanged.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("a write to '{0}' was synthesized inside a let binding's value")]
    WriteUnderLet(String),

    #[error("schedule for loop '{var}' does not end in a counter/variable pair (found '{found}')")]
    ScheduleCloseMismatch { var: String, found: String },

    #[error("schedule underflow while closing loop '{0}'")]
    ScheduleUnderflow(String),

    #[error("iteration domain underflow while leaving loop '{0}'")]
    DomainUnderflow(String),

    #[error("schedules compared equal but have different lengths ({source_len} vs {target_len})")]
    ScheduleLengthMismatch { source_len: usize, target_len: usize },

    #[error("loop '{0}' is inside both ends of a dependence but missing from a schedule")]
    LoopPositionMissing(String),

    #[error(
        "loop '{var}' sits at schedule position {source_pos} in the source \
         but {target_pos} in the target"
    )]
    LoopPositionMismatch {
        var: String,
        source_pos: usize,
        target_pos: usize,
    },
}
