//! Execution targets: one logical "get $X of symbol S filled".

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderSide;

/// Liquidity tier of the traded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    /// Deep, liquid books.
    T1,
    /// Mid-liquidity.
    T2,
    /// Thin books; expect slow maker fills.
    T3,
}

/// Whether the target is a strategic entry or a forced liquidation.
///
/// Purge targets get longer TTLs and qualify for the bounded taker
/// fallback; thin books need more time to reach top-of-book, and a small
/// residual is worth a capped slippage cost to guarantee termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// Strategic entry or exit under normal policy.
    Normal,
    /// Liquidation of a stale or illiquid residual holding.
    Purge,
}

impl ExecutionMode {
    /// Returns true for purge targets.
    #[must_use]
    pub const fn is_purge(&self) -> bool {
        matches!(self, Self::Purge)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Purge => write!(f, "PURGE"),
        }
    }
}

/// One logical execution request, driven to completion by the escalation
/// controller. Accumulates fills across sequential attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTarget {
    /// Total notional to get filled, in USD.
    pub target_notional_usd: Decimal,
    /// Symbol to trade.
    pub symbol: String,
    /// Order side.
    pub side: OrderSide,
    /// Liquidity tier of the asset.
    pub tier: Tier,
    /// Normal entry vs forced liquidation.
    pub mode: ExecutionMode,
    /// Slippage budget for taker fallback, in basis points.
    pub max_slippage_bps: u32,
    /// Exchange minimum order notional, in USD.
    pub min_fill_notional_usd: Decimal,
    /// Notional filled so far across all attempts.
    pub filled_notional_usd: Decimal,
    /// Base units filled so far across all attempts.
    pub filled_base_units: Decimal,
}

impl ExecutionTarget {
    /// Create a target with nothing filled yet.
    #[must_use]
    pub fn new(
        symbol: &str,
        side: OrderSide,
        target_notional_usd: Decimal,
        tier: Tier,
        mode: ExecutionMode,
        max_slippage_bps: u32,
        min_fill_notional_usd: Decimal,
    ) -> Self {
        Self {
            target_notional_usd,
            symbol: symbol.to_string(),
            side,
            tier,
            mode,
            max_slippage_bps,
            min_fill_notional_usd,
            filled_notional_usd: Decimal::ZERO,
            filled_base_units: Decimal::ZERO,
        }
    }

    /// Notional still unfilled.
    #[must_use]
    pub fn remaining_notional_usd(&self) -> Decimal {
        (self.target_notional_usd - self.filled_notional_usd).max(Decimal::ZERO)
    }

    /// Record a fill against this target.
    pub fn record_fill(&mut self, notional_usd: Decimal, base_units: Decimal) {
        self.filled_notional_usd += notional_usd;
        self.filled_base_units += base_units;
    }
}
