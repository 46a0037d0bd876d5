//! Order attempt value objects and status lifecycle.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy base units with quote currency.
    Buy,
    /// Sell base units for quote currency.
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Order aggressiveness, from passive to marketable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    /// Passive limit order that is rejected rather than crossing the book.
    PostOnlyLimit,
    /// Marketable limit, immediate-or-cancel. Pays taker fees.
    LimitIoc,
    /// Unpriced market order.
    Market,
}

impl OrderKind {
    /// Returns true for kinds that resolve immediately against the book
    /// without a TTL wait.
    #[must_use]
    pub const fn is_taker(&self) -> bool {
        matches!(self, Self::LimitIoc | Self::Market)
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostOnlyLimit => write!(f, "POST_ONLY_LIMIT"),
            Self::LimitIoc => write!(f, "LIMIT_IOC"),
            Self::Market => write!(f, "MARKET"),
        }
    }
}

/// Status of one order attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    /// Created but not yet acknowledged by the exchange.
    Pending,
    /// Acknowledged and resting on the book.
    Open,
    /// Partially filled, still open or canceled with a partial fill.
    PartiallyFilled,
    /// Completely filled.
    Filled,
    /// Canceled after a partial fill (remainder returned to the caller).
    Canceled,
    /// TTL reached with zero fill; cancel confirmed.
    Expired,
    /// Rejected by the exchange or lost to a fatal transport error.
    Failed,
}

impl AttemptStatus {
    /// Returns true if the attempt can make no further progress.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Expired | Self::Failed
        )
    }

    /// Returns true if the attempt may still receive fills.
    #[must_use]
    pub const fn can_fill(&self) -> bool {
        matches!(self, Self::Open | Self::PartiallyFilled)
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Open => write!(f, "OPEN"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// One exchange order lifecycle, owned by the attempt executor until
/// terminal. Snapshots are handed outward in the execution result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAttempt {
    /// Globally unique, caller-assigned client order id.
    pub client_order_id: String,
    /// Exchange-assigned order id, present after acknowledgment.
    pub exchange_order_id: Option<String>,
    /// Symbol being traded.
    pub symbol: String,
    /// Order side.
    pub side: OrderSide,
    /// Order aggressiveness.
    pub kind: OrderKind,
    /// Limit price, absent for market orders.
    pub limit_price: Option<Decimal>,
    /// Requested notional for this attempt, in USD.
    pub notional_usd: Decimal,
    /// Time-to-live for maker attempts.
    pub ttl: Duration,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: AttemptStatus,
    /// Filled notional in USD, accumulated across polls.
    pub filled_notional_usd: Decimal,
    /// Filled size in base units.
    pub filled_base_units: Decimal,
}

impl OrderAttempt {
    /// Create a new attempt in `Pending` state with a fresh client order id.
    #[must_use]
    pub fn new(
        symbol: &str,
        side: OrderSide,
        kind: OrderKind,
        notional_usd: Decimal,
        limit_price: Option<Decimal>,
        ttl: Duration,
    ) -> Self {
        Self {
            client_order_id: uuid::Uuid::new_v4().to_string(),
            exchange_order_id: None,
            symbol: symbol.to_string(),
            side,
            kind,
            limit_price,
            notional_usd,
            ttl,
            created_at: Utc::now(),
            status: AttemptStatus::Pending,
            filled_notional_usd: Decimal::ZERO,
            filled_base_units: Decimal::ZERO,
        }
    }

    /// Notional still unfilled on this attempt.
    #[must_use]
    pub fn unfilled_notional_usd(&self) -> Decimal {
        (self.notional_usd - self.filled_notional_usd).max(Decimal::ZERO)
    }
}
