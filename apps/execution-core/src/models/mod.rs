//! Shared value objects for the execution core.
//!
//! These types cross module boundaries: the sizing clamp produces targets,
//! the escalation controller drives attempts against them, and results
//! carry the full attempt trail back to the orchestration loop.

mod order;
mod result;
mod target;

pub use order::{AttemptStatus, OrderAttempt, OrderKind, OrderSide};
pub use result::{ExecutionResult, ExecutionStatus, FailureReason};
pub use target::{ExecutionMode, ExecutionTarget, Tier};
