// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Execution Core - Rate-Limited Order Execution Engine
//!
//! Turns an abstract "spend $X on symbol S under slippage budget Y" request
//! into a sequence of exchange-facing order attempts, under hard
//! capital-preservation constraints:
//!
//! - every exchange call is admitted through a per-channel token bucket,
//!   so the engine never exceeds the exchange's request-rate limits;
//! - proposed sizes are clamped against the exchange minimum-notional
//!   floor and the remaining risk headroom before any order is placed;
//! - maker (post-only) attempts are retried on a TTL schedule, escalating
//!   to a single bounded taker attempt only when purge policy allows.
//!
//! # Modules
//!
//! - [`admission`]: token-bucket rate limiter, one bucket per channel
//! - [`sizing`]: three-way size clamp (exchange floor / risk ceiling / request)
//! - [`models`]: order, target, and result value objects
//! - [`exchange`]: opaque exchange port, error taxonomy, retry, mock
//! - [`execution`]: order attempt lifecycle and the escalation (TWAP/purge) loop
//! - [`config`]: typed configuration with startup validation
//! - [`observability`]: tracing init and metric recording helpers
//! - [`safety`]: cooperative kill switch checked between attempts

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Admission controller - per-channel token-bucket rate limiting.
pub mod admission;

/// Typed configuration with startup validation.
pub mod config;

/// Exchange port trait, error taxonomy, retry policy, mock exchange.
pub mod exchange;

/// Order attempt executor and escalation controller.
pub mod execution;

/// Shared value objects: orders, targets, results.
pub mod models;

/// Tracing and metrics initialization plus recording helpers.
pub mod observability;

/// Kill switch for cooperative abort between attempts.
pub mod safety;

/// Sizing and risk clamp.
pub mod sizing;

pub use admission::{
    AdmissionController, AdmissionError, AdmissionSnapshot, AdmissionStats, Channel,
};
pub use config::{AdmissionConfig, ConfigError, CoreConfig, ExecutionConfig, SizingConfig};
pub use exchange::{ExchangeError, ExchangePort, MockExchange, RetryPolicy};
pub use execution::{AttemptExecutor, EscalationEngine};
pub use models::{
    AttemptStatus, ExecutionMode, ExecutionResult, ExecutionStatus, ExecutionTarget,
    FailureReason, OrderAttempt, OrderKind, OrderSide, Tier,
};
pub use safety::KillSwitch;
pub use sizing::{ClampReason, SizingError, SizingInput, SizingOutcome, clamp};
