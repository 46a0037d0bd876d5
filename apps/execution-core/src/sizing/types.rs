//! Sizing input and outcome types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inputs to the sizing clamp, gathered from the risk/portfolio module
/// and the exchange constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingInput {
    /// Requested size as a percentage of account value (e.g. `1.4`).
    pub requested_size_pct: Decimal,
    /// Current account value, in USD.
    pub account_value_usd: Decimal,
    /// Remaining capacity under the asset's risk cap, in USD.
    pub per_asset_headroom_usd: Decimal,
    /// Position cap for the asset's liquidity tier, in USD.
    pub tier_cap_usd: Decimal,
    /// Theoretical per-position maximum from position-count limits, in USD.
    pub position_count_cap_usd: Decimal,
    /// Exchange minimum order notional, in USD.
    pub min_notional_usd: Decimal,
}

/// How the requested size was adjusted, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum ClampReason {
    /// Requested size accepted (possibly lowered to the risk ceiling).
    None,
    /// Size raised to clear the exchange minimum-notional floor.
    RaisedToMinNotional,
    /// No valid trade size exists: even the minimum viable notional
    /// exceeds the remaining headroom.
    RejectedExposureCap {
        /// `min_notional - headroom`: how much headroom an operator
        /// would need to free for the minimum trade to fit.
        shortfall_usd: Decimal,
    },
}

/// Outcome of the clamp, carrying the arithmetic trail needed to
/// reconstruct the decision without re-running the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingOutcome {
    /// Final size as a percentage of account value; zero when rejected.
    pub size_pct: Decimal,
    /// Final notional, in USD; zero when rejected.
    pub notional_usd: Decimal,
    /// Adjustment applied, if any.
    pub clamp: ClampReason,
    /// Notional implied by the originally requested percentage.
    pub requested_notional_usd: Decimal,
    /// Effective risk ceiling: min of headroom, tier cap, and
    /// position-count cap.
    pub ceiling_usd: Decimal,
}

impl SizingOutcome {
    /// Returns true when no valid trade size exists.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self.clamp, ClampReason::RejectedExposureCap { .. })
    }
}
