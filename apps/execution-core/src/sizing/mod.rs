//! Sizing and risk clamp.
//!
//! Resolves a proposed fractional size against three constraints at once:
//! the exchange minimum-notional floor, the remaining risk headroom, and
//! the requested size. The outcome is accepted (possibly raised to the
//! floor or lowered to the ceiling) or rejected with an actionable
//! shortfall amount operators use to decide whether trimming an existing
//! position would free enough headroom.

mod clamp;
mod error;
mod types;

pub use clamp::clamp;
pub use error::SizingError;
pub use types::{ClampReason, SizingInput, SizingOutcome};
