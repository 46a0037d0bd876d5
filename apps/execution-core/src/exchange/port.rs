//! Exchange Port (Driven Port)
//!
//! Interface for placing, polling, and canceling orders on an exchange.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AttemptStatus, OrderKind, OrderSide};

use super::error::ExchangeError;

/// Request to place an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    /// Caller-assigned, globally unique client order id.
    pub client_order_id: String,
    /// Symbol to trade.
    pub symbol: String,
    /// Order side.
    pub side: OrderSide,
    /// Order aggressiveness.
    pub kind: OrderKind,
    /// Requested notional, in USD.
    pub notional_usd: Decimal,
    /// Limit price; required for limit kinds, absent for market orders.
    pub limit_price: Option<Decimal>,
}

/// Acknowledgment of a placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    /// Exchange-assigned order id.
    pub exchange_order_id: String,
}

/// Point-in-time order status as reported by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusReport {
    /// Exchange view of the lifecycle status.
    pub status: AttemptStatus,
    /// Filled notional so far, in USD.
    pub filled_notional_usd: Decimal,
    /// Filled size so far, in base units.
    pub filled_base_units: Decimal,
}

/// Acknowledgment of a cancel, carrying the fill state the exchange
/// reported at cancel time. The exchange may fill concurrently with the
/// cancel; callers reconcile with a post-cancel [`ExchangePort::list_fills`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAck {
    /// Filled notional reported at cancel time, in USD.
    pub filled_notional_usd: Decimal,
    /// Filled base units reported at cancel time.
    pub filled_base_units: Decimal,
}

/// One execution fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    /// Fill notional, in USD.
    pub notional_usd: Decimal,
    /// Fill size, in base units.
    pub base_units: Decimal,
    /// Fill price.
    pub price: Decimal,
}

/// Top-of-book snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TopOfBook {
    /// Best bid.
    pub bid: Decimal,
    /// Best ask.
    pub ask: Decimal,
    /// Price increment of the book.
    pub tick: Decimal,
}

/// Opaque exchange transport consumed by the execution core.
///
/// Implementations map their wire-level error codes into
/// [`ExchangeError`]; the core decides retry behavior from that taxonomy
/// alone.
#[async_trait]
pub trait ExchangePort: Send + Sync {
    /// Submit an order.
    async fn place_order(&self, request: &PlaceOrderRequest) -> Result<OrderAck, ExchangeError>;

    /// Query current order status and cumulative fill.
    async fn order_status(&self, exchange_order_id: &str)
    -> Result<OrderStatusReport, ExchangeError>;

    /// Cancel an open order.
    async fn cancel_order(&self, exchange_order_id: &str) -> Result<CancelAck, ExchangeError>;

    /// List all fills for an order, including any that landed during the
    /// cancel race.
    async fn list_fills(&self, exchange_order_id: &str) -> Result<Vec<Fill>, ExchangeError>;

    /// Top-of-book quote for a symbol.
    async fn quote(&self, symbol: &str) -> Result<TopOfBook, ExchangeError>;
}
