//! Order execution: single-attempt lifecycle and the escalation loop.
//!
//! The attempt executor owns one order from placement to a terminal
//! state. The escalation engine drives repeated attempts against an
//! execution target, switching from maker to taker aggressiveness only
//! when purge policy allows.

mod attempt;
mod escalation;
mod pricing;

pub use attempt::AttemptExecutor;
pub use escalation::EscalationEngine;
pub use pricing::{maker_price, taker_limit_price};
