//! Scripted in-memory exchange for tests and demos.
//!
//! Each placed order consumes the next [`OrderScript`] from a queue, so a
//! test can stage a full escalation scenario up front: two maker slices
//! that rest unfilled, then a taker that fills, and so on. Call counters
//! let tests prove that every network call paid an admission token.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::AttemptStatus;

use super::error::ExchangeError;
use super::port::{
    CancelAck, ExchangePort, Fill, OrderAck, OrderStatusReport, PlaceOrderRequest, TopOfBook,
};

/// Scripted outcome for one placed order.
#[derive(Debug, Clone)]
pub enum OrderScript {
    /// Maker order rests on the book and never fills.
    RestUnfilled,
    /// Maker order fills completely after N status polls.
    FillAfterPolls {
        /// Poll count before the fill appears.
        polls: u32,
    },
    /// Maker order fills `fraction` of its notional after N polls.
    PartialFillAfterPolls {
        /// Poll count before the fill appears.
        polls: u32,
        /// Fraction filled, in `[0, 1]`.
        fraction: Decimal,
    },
    /// Reject the next `times` placements (post-only would cross), then
    /// accept and rest unfilled.
    RejectPostOnly {
        /// Remaining rejections.
        times: u32,
    },
    /// Fail the next `times` placements with a transient error, then
    /// accept and rest unfilled.
    TransientOnPlace {
        /// Remaining transient failures.
        times: u32,
    },
    /// Maker order is killed exchange-side after N status polls (e.g.
    /// self-trade prevention) and reports `Failed`.
    FailAfterPolls {
        /// Poll count before the failure is reported.
        polls: u32,
    },
    /// Taker order fills `fraction` of its notional immediately.
    TakerFill {
        /// Fraction filled, in `[0, 1]`.
        fraction: Decimal,
    },
    /// Reject the taker placement outright.
    TakerReject,
    /// Maker order shows no fill at cancel time, but a fill for
    /// `fraction` of the notional lands during the cancel race and is
    /// only visible through `list_fills`.
    FillDuringCancelRace {
        /// Fraction filled during the race, in `[0, 1]`.
        fraction: Decimal,
    },
}

#[derive(Debug)]
struct MockOrder {
    script: OrderScript,
    status: AttemptStatus,
    polls: u32,
    notional_usd: Decimal,
    price: Decimal,
    filled_notional_usd: Decimal,
    filled_base_units: Decimal,
    fills: Vec<Fill>,
    race_fill: Option<Fill>,
}

impl MockOrder {
    fn fill_fraction(&mut self, fraction: Decimal) {
        let notional = self.notional_usd * fraction;
        let units = notional / self.price;
        self.filled_notional_usd = notional;
        self.filled_base_units = units;
        self.fills.push(Fill {
            notional_usd: notional,
            base_units: units,
            price: self.price,
        });
        self.status = if fraction >= Decimal::ONE {
            AttemptStatus::Filled
        } else if notional > Decimal::ZERO {
            AttemptStatus::PartiallyFilled
        } else {
            self.status
        };
    }
}

#[derive(Debug, Default)]
struct MockState {
    scripts: VecDeque<OrderScript>,
    orders: HashMap<String, MockOrder>,
    next_id: u64,
}

/// Scripted stateful exchange implementing [`ExchangePort`].
#[derive(Debug)]
pub struct MockExchange {
    state: Mutex<MockState>,
    book: TopOfBook,
    place_calls: AtomicU64,
    status_calls: AtomicU64,
    cancel_calls: AtomicU64,
    fills_calls: AtomicU64,
    quote_calls: AtomicU64,
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new(TopOfBook {
            bid: Decimal::new(10_000, 2),  // 100.00
            ask: Decimal::new(10_010, 2),  // 100.10
            tick: Decimal::new(1, 2),      // 0.01
        })
    }
}

impl MockExchange {
    /// Create a mock with a fixed top-of-book.
    #[must_use]
    pub fn new(book: TopOfBook) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            book,
            place_calls: AtomicU64::new(0),
            status_calls: AtomicU64::new(0),
            cancel_calls: AtomicU64::new(0),
            fills_calls: AtomicU64::new(0),
            quote_calls: AtomicU64::new(0),
        }
    }

    /// Queue the scripted outcome for the next placed order.
    pub fn script(&self, script: OrderScript) {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .scripts
            .push_back(script);
    }

    /// Total calls that hit the private (trading) surface.
    pub fn private_calls(&self) -> u64 {
        self.place_calls.load(Ordering::Relaxed)
            + self.status_calls.load(Ordering::Relaxed)
            + self.cancel_calls.load(Ordering::Relaxed)
            + self.fills_calls.load(Ordering::Relaxed)
    }

    /// Total calls that hit the public (market data) surface.
    pub fn public_calls(&self) -> u64 {
        self.quote_calls.load(Ordering::Relaxed)
    }

    /// Placements accepted or rejected so far.
    pub fn place_calls(&self) -> u64 {
        self.place_calls.load(Ordering::Relaxed)
    }

    /// Number of cancel calls observed.
    pub fn cancel_calls(&self) -> u64 {
        self.cancel_calls.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ExchangePort for MockExchange {
    async fn place_order(&self, request: &PlaceOrderRequest) -> Result<OrderAck, ExchangeError> {
        self.place_calls.fetch_add(1, Ordering::Relaxed);
        let mut state = self.lock();

        // Rejection/transient scripts stay at the head until exhausted so
        // a retried placement sees the next stage of the same script.
        let head_error = match state.scripts.front_mut() {
            Some(OrderScript::RejectPostOnly { times }) if *times > 0 => {
                *times -= 1;
                let exhausted = *times == 0;
                Some((
                    ExchangeError::Rejected("post-only order would cross the book".to_string()),
                    exhausted,
                    false,
                ))
            }
            Some(OrderScript::TransientOnPlace { times }) if *times > 0 => {
                *times -= 1;
                let exhausted = *times == 0;
                Some((
                    ExchangeError::Transient("connection reset".to_string()),
                    exhausted,
                    false,
                ))
            }
            Some(OrderScript::TakerReject) => Some((
                ExchangeError::Rejected("insufficient liquidity inside slippage cap".to_string()),
                false,
                true,
            )),
            _ => None,
        };
        if let Some((error, exhausted, pop)) = head_error {
            if exhausted {
                state.scripts[0] = OrderScript::RestUnfilled;
            }
            if pop {
                state.scripts.pop_front();
            }
            return Err(error);
        }

        let script = state.scripts.pop_front().unwrap_or(OrderScript::RestUnfilled);
        state.next_id += 1;
        let exchange_order_id = format!("ex-{}", state.next_id);

        let price = request.limit_price.unwrap_or(if request.kind.is_taker() {
            self.book.ask
        } else {
            self.book.bid
        });
        let mut order = MockOrder {
            script: script.clone(),
            status: AttemptStatus::Open,
            polls: 0,
            notional_usd: request.notional_usd,
            price,
            filled_notional_usd: Decimal::ZERO,
            filled_base_units: Decimal::ZERO,
            fills: Vec::new(),
            race_fill: None,
        };

        if let OrderScript::TakerFill { fraction } = script {
            order.fill_fraction(fraction);
        }

        state.orders.insert(exchange_order_id.clone(), order);
        Ok(OrderAck { exchange_order_id })
    }

    async fn order_status(
        &self,
        exchange_order_id: &str,
    ) -> Result<OrderStatusReport, ExchangeError> {
        self.status_calls.fetch_add(1, Ordering::Relaxed);
        let mut state = self.lock();
        let order = state
            .orders
            .get_mut(exchange_order_id)
            .ok_or_else(|| ExchangeError::OrderNotFound(exchange_order_id.to_string()))?;

        order.polls += 1;
        if order.status.can_fill() {
            match order.script {
                OrderScript::FillAfterPolls { polls } if order.polls >= polls => {
                    order.fill_fraction(Decimal::ONE);
                }
                OrderScript::PartialFillAfterPolls { polls, fraction }
                    if order.polls >= polls && order.filled_notional_usd.is_zero() =>
                {
                    order.fill_fraction(fraction);
                }
                OrderScript::FailAfterPolls { polls } if order.polls >= polls => {
                    order.status = AttemptStatus::Failed;
                }
                _ => {}
            }
        }

        Ok(OrderStatusReport {
            status: order.status,
            filled_notional_usd: order.filled_notional_usd,
            filled_base_units: order.filled_base_units,
        })
    }

    async fn cancel_order(&self, exchange_order_id: &str) -> Result<CancelAck, ExchangeError> {
        self.cancel_calls.fetch_add(1, Ordering::Relaxed);
        let mut state = self.lock();
        let order = state
            .orders
            .get_mut(exchange_order_id)
            .ok_or_else(|| ExchangeError::OrderNotFound(exchange_order_id.to_string()))?;

        let ack = CancelAck {
            filled_notional_usd: order.filled_notional_usd,
            filled_base_units: order.filled_base_units,
        };

        if order.status.can_fill() {
            order.status = AttemptStatus::Canceled;
            // The race: a fill lands while the cancel is in flight. The
            // cancel ack does not know about it; only list_fills does.
            if let OrderScript::FillDuringCancelRace { fraction } = order.script {
                let notional = order.notional_usd * fraction;
                let units = notional / order.price;
                order.race_fill = Some(Fill {
                    notional_usd: notional,
                    base_units: units,
                    price: order.price,
                });
            }
        }

        Ok(ack)
    }

    async fn list_fills(&self, exchange_order_id: &str) -> Result<Vec<Fill>, ExchangeError> {
        self.fills_calls.fetch_add(1, Ordering::Relaxed);
        let state = self.lock();
        let order = state
            .orders
            .get(exchange_order_id)
            .ok_or_else(|| ExchangeError::OrderNotFound(exchange_order_id.to_string()))?;

        let mut fills = order.fills.clone();
        if let Some(race) = &order.race_fill {
            fills.push(race.clone());
        }
        Ok(fills)
    }

    async fn quote(&self, _symbol: &str) -> Result<TopOfBook, ExchangeError> {
        self.quote_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderKind, OrderSide};
    use rust_decimal_macros::dec;

    fn request(kind: OrderKind, notional: Decimal) -> PlaceOrderRequest {
        PlaceOrderRequest {
            client_order_id: "c-1".to_string(),
            symbol: "BTC-USD".to_string(),
            side: OrderSide::Buy,
            kind,
            notional_usd: notional,
            limit_price: Some(dec!(100)),
        }
    }

    #[tokio::test]
    async fn maker_fills_after_scripted_polls() {
        let mock = MockExchange::default();
        mock.script(OrderScript::FillAfterPolls { polls: 2 });
        let ack = mock
            .place_order(&request(OrderKind::PostOnlyLimit, dec!(10)))
            .await
            .unwrap();

        let first = mock.order_status(&ack.exchange_order_id).await.unwrap();
        assert_eq!(first.status, AttemptStatus::Open);
        let second = mock.order_status(&ack.exchange_order_id).await.unwrap();
        assert_eq!(second.status, AttemptStatus::Filled);
        assert_eq!(second.filled_notional_usd, dec!(10));
    }

    #[tokio::test]
    async fn reject_script_exhausts_then_accepts() {
        let mock = MockExchange::default();
        mock.script(OrderScript::RejectPostOnly { times: 2 });
        let req = request(OrderKind::PostOnlyLimit, dec!(10));

        assert!(matches!(
            mock.place_order(&req).await,
            Err(ExchangeError::Rejected(_))
        ));
        assert!(matches!(
            mock.place_order(&req).await,
            Err(ExchangeError::Rejected(_))
        ));
        assert!(mock.place_order(&req).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_race_fill_only_visible_via_list_fills() {
        let mock = MockExchange::default();
        mock.script(OrderScript::FillDuringCancelRace {
            fraction: dec!(0.5),
        });
        let ack = mock
            .place_order(&request(OrderKind::PostOnlyLimit, dec!(10)))
            .await
            .unwrap();

        let cancel = mock.cancel_order(&ack.exchange_order_id).await.unwrap();
        assert_eq!(cancel.filled_notional_usd, Decimal::ZERO);

        let fills = mock.list_fills(&ack.exchange_order_id).await.unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].notional_usd, dec!(5.0));
    }

    #[tokio::test]
    async fn taker_fill_resolves_at_placement() {
        let mock = MockExchange::default();
        mock.script(OrderScript::TakerFill {
            fraction: Decimal::ONE,
        });
        let ack = mock
            .place_order(&request(OrderKind::LimitIoc, dec!(16.19)))
            .await
            .unwrap();
        let report = mock.order_status(&ack.exchange_order_id).await.unwrap();
        assert_eq!(report.status, AttemptStatus::Filled);
        assert_eq!(report.filled_notional_usd, dec!(16.19));
    }

    #[tokio::test]
    async fn call_counters_split_by_surface() {
        let mock = MockExchange::default();
        mock.quote("BTC-USD").await.unwrap();
        let ack = mock
            .place_order(&request(OrderKind::PostOnlyLimit, dec!(10)))
            .await
            .unwrap();
        mock.order_status(&ack.exchange_order_id).await.unwrap();
        assert_eq!(mock.public_calls(), 1);
        assert_eq!(mock.private_calls(), 2);
    }
}
