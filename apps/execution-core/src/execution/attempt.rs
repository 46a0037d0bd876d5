//! Order attempt executor: one exchange order from placement to a
//! terminal state.
//!
//! Every placement, status poll, cancel, and fills query consumes one
//! token from the private admission channel before the network call.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::admission::{AdmissionController, Channel};
use crate::exchange::{Backoff, CancelAck, ExchangeError, ExchangePort, PlaceOrderRequest, RetryPolicy};
use crate::models::{AttemptStatus, OrderAttempt, OrderKind, OrderSide};
use crate::observability::metrics;

/// Places single orders and tracks them until terminal.
pub struct AttemptExecutor {
    admission: Arc<AdmissionController>,
    exchange: Arc<dyn ExchangePort>,
    retry: RetryPolicy,
    poll_interval: Duration,
}

impl AttemptExecutor {
    /// Create an executor sharing the process-wide admission controller.
    #[must_use]
    pub fn new(
        admission: Arc<AdmissionController>,
        exchange: Arc<dyn ExchangePort>,
        retry: RetryPolicy,
        poll_interval: Duration,
    ) -> Self {
        Self {
            admission,
            exchange,
            retry,
            poll_interval,
        }
    }

    /// Submit one order.
    ///
    /// Transient errors are retried with the same parameters up to the
    /// retry policy's budget; once exhausted the attempt comes back with
    /// status [`AttemptStatus::Failed`] so the caller counts it as a
    /// no-fill. An exchange-side rate limit sleeps out the suggested
    /// backoff and retries, since it signals drift between our bucket
    /// and the exchange's.
    ///
    /// # Errors
    ///
    /// [`ExchangeError::Rejected`] propagates so the caller can re-price
    /// (cushion widening); fatal errors propagate as-is.
    pub async fn place(
        &self,
        symbol: &str,
        side: OrderSide,
        kind: OrderKind,
        notional_usd: Decimal,
        limit_price: Option<Decimal>,
        ttl: Duration,
    ) -> Result<OrderAttempt, ExchangeError> {
        let mut attempt = OrderAttempt::new(symbol, side, kind, notional_usd, limit_price, ttl);
        let request = PlaceOrderRequest {
            client_order_id: attempt.client_order_id.clone(),
            symbol: attempt.symbol.clone(),
            side,
            kind,
            notional_usd,
            limit_price,
        };

        let mut backoff = Backoff::new(&self.retry);
        loop {
            self.admission.acquire(Channel::Private, 1.0).await;
            match self.exchange.place_order(&request).await {
                Ok(ack) => {
                    attempt.exchange_order_id = Some(ack.exchange_order_id);
                    attempt.status = AttemptStatus::Open;
                    metrics::record_attempt(kind);
                    tracing::debug!(
                        symbol = %attempt.symbol,
                        side = %side,
                        kind = %kind,
                        notional_usd = %notional_usd,
                        price = ?limit_price,
                        client_order_id = %attempt.client_order_id,
                        "order placed"
                    );
                    return Ok(attempt);
                }
                Err(ExchangeError::RateLimited { retry_after }) => {
                    let tokens = self.admission.tokens(Channel::Private).await;
                    tracing::warn!(
                        bucket_tokens = tokens,
                        retry_after_ms = retry_after.as_millis(),
                        "exchange rate limit despite admission control, backing off"
                    );
                    if backoff.next_backoff().is_none() {
                        attempt.status = AttemptStatus::Failed;
                        return Ok(attempt);
                    }
                    tokio::time::sleep(retry_after).await;
                }
                Err(ExchangeError::Transient(message)) => match backoff.next_backoff() {
                    Some(delay) => {
                        tracing::warn!(
                            error = %message,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt(),
                            "transient error on placement, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::warn!(
                            error = %message,
                            "placement retries exhausted, counting as no-fill"
                        );
                        attempt.status = AttemptStatus::Failed;
                        return Ok(attempt);
                    }
                },
                Err(error) => return Err(error),
            }
        }
    }

    /// Drive an open attempt to a terminal state.
    ///
    /// Taker attempts resolve with a single status query and no TTL
    /// wait. Maker attempts are polled until the TTL elapses or a
    /// terminal state is observed; on expiry the remainder is canceled
    /// and the cancel race reconciled.
    ///
    /// # Errors
    ///
    /// Propagates fatal exchange errors; transient poll failures are
    /// absorbed by the next poll tick.
    pub async fn poll_until_terminal(
        &self,
        attempt: &mut OrderAttempt,
    ) -> Result<(), ExchangeError> {
        if attempt.status.is_terminal() {
            return Ok(());
        }
        let Some(order_id) = attempt.exchange_order_id.clone() else {
            return Ok(());
        };

        if attempt.kind.is_taker() {
            self.admission.acquire(Channel::Private, 1.0).await;
            let report = self.exchange.order_status(&order_id).await?;
            attempt.filled_notional_usd = report.filled_notional_usd;
            attempt.filled_base_units = report.filled_base_units;
            attempt.status = if report.filled_notional_usd >= attempt.notional_usd {
                AttemptStatus::Filled
            } else if report.filled_notional_usd > Decimal::ZERO {
                AttemptStatus::PartiallyFilled
            } else {
                AttemptStatus::Failed
            };
            tracing::debug!(
                client_order_id = %attempt.client_order_id,
                status = %attempt.status,
                filled_notional_usd = %attempt.filled_notional_usd,
                "taker attempt resolved"
            );
            return Ok(());
        }

        // TTL measured from the start of polling; placement latency is
        // not charged against the order's resting time.
        let deadline = Instant::now() + attempt.ttl;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let tick = self.poll_interval.min(deadline - now);
            tokio::time::sleep(tick).await;

            self.admission.acquire(Channel::Private, 1.0).await;
            match self.exchange.order_status(&order_id).await {
                Ok(report) => {
                    attempt.filled_notional_usd = report.filled_notional_usd;
                    attempt.filled_base_units = report.filled_base_units;
                    match report.status {
                        AttemptStatus::Filled => {
                            attempt.status = AttemptStatus::Filled;
                            tracing::debug!(
                                client_order_id = %attempt.client_order_id,
                                filled_notional_usd = %attempt.filled_notional_usd,
                                "maker attempt filled"
                            );
                            return Ok(());
                        }
                        AttemptStatus::Canceled | AttemptStatus::Expired => {
                            // Canceled out from under us (e.g. mass cancel).
                            attempt.status =
                                if attempt.filled_notional_usd > Decimal::ZERO {
                                    AttemptStatus::Canceled
                                } else {
                                    AttemptStatus::Expired
                                };
                            return Ok(());
                        }
                        AttemptStatus::Failed => {
                            // Killed exchange-side (e.g. self-trade
                            // prevention); nothing left to cancel.
                            attempt.status = AttemptStatus::Failed;
                            tracing::warn!(
                                client_order_id = %attempt.client_order_id,
                                "exchange reported order failed while resting"
                            );
                            return Ok(());
                        }
                        AttemptStatus::PartiallyFilled => {
                            attempt.status = AttemptStatus::PartiallyFilled;
                        }
                        _ => {}
                    }
                }
                Err(error) if error.is_retryable() => {
                    tracing::warn!(
                        error = %error,
                        client_order_id = %attempt.client_order_id,
                        "status poll failed, will retry next tick"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        // TTL elapsed with no or partial fill.
        self.cancel(attempt).await
    }

    /// Cancel an attempt and reconcile the cancel race.
    ///
    /// The exchange may fill concurrently with the cancel, so after the
    /// cancel ack the fills are re-queried and the larger of the two
    /// views wins.
    ///
    /// # Errors
    ///
    /// Propagates fatal exchange errors once the transient budget is
    /// exhausted.
    pub async fn cancel(&self, attempt: &mut OrderAttempt) -> Result<(), ExchangeError> {
        if attempt.status.is_terminal() {
            return Ok(());
        }
        let Some(order_id) = attempt.exchange_order_id.clone() else {
            return Ok(());
        };

        let ack = self.cancel_with_retry(&order_id).await?;
        metrics::record_cancel();

        self.admission.acquire(Channel::Private, 1.0).await;
        let fills = self.exchange.list_fills(&order_id).await?;
        let post_notional: Decimal = fills.iter().map(|f| f.notional_usd).sum();
        let post_units: Decimal = fills.iter().map(|f| f.base_units).sum();

        // Larger of: fill reported at cancel time, fill from the
        // post-cancel query.
        let (filled_notional, filled_units) = if post_notional > ack.filled_notional_usd {
            (post_notional, post_units)
        } else {
            (ack.filled_notional_usd, ack.filled_base_units)
        };
        attempt.filled_notional_usd = filled_notional;
        attempt.filled_base_units = filled_units;
        attempt.status = if filled_notional >= attempt.notional_usd {
            AttemptStatus::Filled
        } else if filled_notional > Decimal::ZERO {
            AttemptStatus::Canceled
        } else {
            AttemptStatus::Expired
        };

        tracing::debug!(
            client_order_id = %attempt.client_order_id,
            status = %attempt.status,
            filled_notional_usd = %attempt.filled_notional_usd,
            "attempt canceled and reconciled"
        );
        Ok(())
    }

    async fn cancel_with_retry(&self, order_id: &str) -> Result<CancelAck, ExchangeError> {
        let mut backoff = Backoff::new(&self.retry);
        loop {
            self.admission.acquire(Channel::Private, 1.0).await;
            match self.exchange.cancel_order(order_id).await {
                Ok(ack) => return Ok(ack),
                Err(error) if error.is_retryable() => match backoff.next_backoff() {
                    Some(delay) => {
                        tracing::warn!(
                            error = %error,
                            delay_ms = delay.as_millis(),
                            "transient error on cancel, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        return Err(ExchangeError::Fatal(format!(
                            "cancel retries exhausted for {order_id}: {error}"
                        )));
                    }
                },
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdmissionConfig;
    use crate::exchange::{MockExchange, OrderScript};
    use rust_decimal_macros::dec;

    fn executor(mock: Arc<MockExchange>) -> AttemptExecutor {
        let admission = Arc::new(
            AdmissionController::new(&AdmissionConfig::default()).expect("valid config"),
        );
        AttemptExecutor::new(
            admission,
            mock,
            RetryPolicy {
                jitter_factor: 0.0,
                ..Default::default()
            },
            Duration::from_secs(1),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn maker_fill_observed_during_polling() {
        let mock = Arc::new(MockExchange::default());
        mock.script(OrderScript::FillAfterPolls { polls: 2 });
        let exec = executor(Arc::clone(&mock));

        let mut attempt = exec
            .place(
                "BTC-USD",
                OrderSide::Buy,
                OrderKind::PostOnlyLimit,
                dec!(10),
                Some(dec!(99.99)),
                Duration::from_secs(12),
            )
            .await
            .expect("placement succeeds");
        assert_eq!(attempt.status, AttemptStatus::Open);

        exec.poll_until_terminal(&mut attempt).await.expect("polls");
        assert_eq!(attempt.status, AttemptStatus::Filled);
        assert_eq!(attempt.filled_notional_usd, dec!(10));
    }

    #[tokio::test(start_paused = true)]
    async fn maker_expires_and_cancels_at_ttl() {
        let mock = Arc::new(MockExchange::default());
        mock.script(OrderScript::RestUnfilled);
        let exec = executor(Arc::clone(&mock));

        let mut attempt = exec
            .place(
                "BTC-USD",
                OrderSide::Buy,
                OrderKind::PostOnlyLimit,
                dec!(10),
                Some(dec!(99.99)),
                Duration::from_secs(8),
            )
            .await
            .expect("placement succeeds");

        exec.poll_until_terminal(&mut attempt).await.expect("polls");
        assert_eq!(attempt.status, AttemptStatus::Expired);
        assert_eq!(attempt.filled_notional_usd, Decimal::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn exchange_side_failure_ends_polling_without_cancel() {
        let mock = Arc::new(MockExchange::default());
        mock.script(OrderScript::FailAfterPolls { polls: 2 });
        let exec = executor(Arc::clone(&mock));

        let mut attempt = exec
            .place(
                "BTC-USD",
                OrderSide::Buy,
                OrderKind::PostOnlyLimit,
                dec!(10),
                Some(dec!(99.99)),
                Duration::from_secs(12),
            )
            .await
            .expect("placement succeeds");

        exec.poll_until_terminal(&mut attempt).await.expect("polls");
        assert_eq!(attempt.status, AttemptStatus::Failed);
        assert_eq!(attempt.filled_notional_usd, Decimal::ZERO);
        // Nothing is resting on the book anymore, so no cancel is sent.
        assert_eq!(mock.cancel_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_race_takes_larger_fill() {
        let mock = Arc::new(MockExchange::default());
        mock.script(OrderScript::FillDuringCancelRace {
            fraction: dec!(0.4),
        });
        let exec = executor(Arc::clone(&mock));

        let mut attempt = exec
            .place(
                "ETH-USD",
                OrderSide::Sell,
                OrderKind::PostOnlyLimit,
                dec!(20),
                Some(dec!(100.11)),
                Duration::from_secs(8),
            )
            .await
            .expect("placement succeeds");

        exec.poll_until_terminal(&mut attempt).await.expect("polls");
        // Cancel ack reported zero, but the post-cancel fills query saw
        // the race fill; the larger view wins.
        assert_eq!(attempt.status, AttemptStatus::Canceled);
        assert_eq!(attempt.filled_notional_usd, dec!(8.0));
    }

    #[tokio::test(start_paused = true)]
    async fn taker_resolves_without_ttl_wait() {
        let mock = Arc::new(MockExchange::default());
        mock.script(OrderScript::TakerFill {
            fraction: Decimal::ONE,
        });
        let exec = executor(Arc::clone(&mock));

        let mut attempt = exec
            .place(
                "DOGE-USD",
                OrderSide::Sell,
                OrderKind::LimitIoc,
                dec!(16.19),
                Some(dec!(99.00)),
                Duration::ZERO,
            )
            .await
            .expect("placement succeeds");

        exec.poll_until_terminal(&mut attempt).await.expect("resolves");
        assert_eq!(attempt.status, AttemptStatus::Filled);
        assert_eq!(attempt.filled_notional_usd, dec!(16.19));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_placement_errors_retry_then_succeed() {
        let mock = Arc::new(MockExchange::default());
        mock.script(OrderScript::TransientOnPlace { times: 2 });
        let exec = executor(Arc::clone(&mock));

        let attempt = exec
            .place(
                "BTC-USD",
                OrderSide::Buy,
                OrderKind::PostOnlyLimit,
                dec!(10),
                Some(dec!(99.99)),
                Duration::from_secs(8),
            )
            .await
            .expect("third placement succeeds");
        assert_eq!(attempt.status, AttemptStatus::Open);
        assert_eq!(mock.place_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_transient_budget_counts_as_no_fill() {
        let mock = Arc::new(MockExchange::default());
        mock.script(OrderScript::TransientOnPlace { times: 10 });
        let exec = executor(Arc::clone(&mock));

        let attempt = exec
            .place(
                "BTC-USD",
                OrderSide::Buy,
                OrderKind::PostOnlyLimit,
                dec!(10),
                Some(dec!(99.99)),
                Duration::from_secs(8),
            )
            .await
            .expect("failure is absorbed into the attempt");
        assert_eq!(attempt.status, AttemptStatus::Failed);
        assert!(attempt.exchange_order_id.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_propagates_for_repricing() {
        let mock = Arc::new(MockExchange::default());
        mock.script(OrderScript::RejectPostOnly { times: 1 });
        let exec = executor(Arc::clone(&mock));

        let result = exec
            .place(
                "BTC-USD",
                OrderSide::Buy,
                OrderKind::PostOnlyLimit,
                dec!(10),
                Some(dec!(100.00)),
                Duration::from_secs(8),
            )
            .await;
        assert!(matches!(result, Err(ExchangeError::Rejected(_))));
    }
}
