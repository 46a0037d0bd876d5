//! Terminal execution outcomes returned to the orchestration loop.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderAttempt;

/// Final status of one execution target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Target notional fully filled.
    Success,
    /// Some fill, but the loop terminated before completion.
    Partial,
    /// No acceptable outcome; see the failure reason.
    Failed,
    /// Sizing rejected the target before any order was placed.
    ExposureRejected,
    /// Kill switch tripped between attempts.
    Aborted,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Partial => write!(f, "PARTIAL"),
            Self::Failed => write!(f, "FAILED"),
            Self::ExposureRejected => write!(f, "EXPOSURE_REJECTED"),
            Self::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// Machine-readable reason for a non-success terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Maker attempts exhausted without qualifying for taker fallback.
    ResidualExceedsThreshold,
    /// The single permitted taker attempt failed; no further retries.
    TakerFallbackFailed,
    /// Remaining notional dropped below the exchange minimum order size.
    ResidualBelowExchangeMinimum,
    /// Kill switch tripped.
    KillSwitch,
    /// Fatal exchange error outside the retryable taxonomy.
    ExchangeFatal,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResidualExceedsThreshold => write!(f, "residual_exceeds_threshold"),
            Self::TakerFallbackFailed => write!(f, "taker_fallback_failed"),
            Self::ResidualBelowExchangeMinimum => write!(f, "residual_below_exchange_minimum"),
            Self::KillSwitch => write!(f, "kill_switch"),
            Self::ExchangeFatal => write!(f, "exchange_fatal"),
        }
    }
}

/// Result of driving one execution target to a terminal state.
///
/// Carries the full attempt trail so the outcome can be reconstructed
/// without re-running the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Terminal status.
    pub status: ExecutionStatus,
    /// Reason code for non-success outcomes.
    pub reason: Option<FailureReason>,
    /// Total notional filled across all attempts, in USD.
    pub filled_notional_usd: Decimal,
    /// Total base units filled across all attempts.
    pub filled_base_units: Decimal,
    /// Every attempt placed, in order.
    pub attempts: Vec<OrderAttempt>,
}

impl ExecutionResult {
    /// Returns true if any notional was filled.
    #[must_use]
    pub fn has_fill(&self) -> bool {
        self.filled_notional_usd > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_render_snake_case() {
        assert_eq!(
            FailureReason::ResidualExceedsThreshold.to_string(),
            "residual_exceeds_threshold"
        );
        assert_eq!(FailureReason::KillSwitch.to_string(), "kill_switch");
    }

    #[test]
    fn status_renders_screaming_snake_case() {
        assert_eq!(ExecutionStatus::ExposureRejected.to_string(), "EXPOSURE_REJECTED");
    }
}
