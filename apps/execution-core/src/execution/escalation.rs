//! Escalation controller: the TWAP/purge loop driving one execution
//! target through sequential attempts.
//!
//! Maker-only execution minimizes fees and slippage but can loop forever
//! against a thin book. The loop therefore escalates to exactly one
//! bounded taker attempt for small purge residuals, and otherwise gives
//! up after a configured ceiling of consecutive no-fills.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::admission::{AdmissionController, Channel};
use crate::config::ExecutionConfig;
use crate::exchange::{Backoff, ExchangeError, ExchangePort, TopOfBook};
use crate::models::{
    AttemptStatus, ExecutionResult, ExecutionStatus, ExecutionTarget, FailureReason, OrderAttempt,
    OrderKind,
};
use crate::observability::metrics;
use crate::safety::KillSwitch;

use super::attempt::AttemptExecutor;
use super::pricing::{maker_price, taker_limit_price};

/// Drives execution targets to a terminal outcome.
///
/// One engine may serve many targets concurrently (one task per target);
/// attempts within a single target are strictly sequential, and the only
/// shared mutable state across targets is the admission controller.
pub struct EscalationEngine {
    executor: AttemptExecutor,
    admission: Arc<AdmissionController>,
    exchange: Arc<dyn ExchangePort>,
    config: ExecutionConfig,
    kill_switch: KillSwitch,
}

impl EscalationEngine {
    /// Create an engine over a shared admission controller and exchange.
    #[must_use]
    pub fn new(
        admission: Arc<AdmissionController>,
        exchange: Arc<dyn ExchangePort>,
        config: ExecutionConfig,
        kill_switch: KillSwitch,
    ) -> Self {
        let executor = AttemptExecutor::new(
            Arc::clone(&admission),
            Arc::clone(&exchange),
            config.retry.clone(),
            config.poll_interval(),
        );
        Self {
            executor,
            admission,
            exchange,
            config,
            kill_switch,
        }
    }

    /// Drive a target until terminal.
    ///
    /// Only target-level outcomes leave this method; attempt-local
    /// errors are absorbed into the no-fill/retry bookkeeping.
    pub async fn execute(&self, target: ExecutionTarget) -> ExecutionResult {
        let mut target = target;
        let mut attempts: Vec<OrderAttempt> = Vec::new();
        let mut consecutive_no_fill: u32 = 0;
        let mut attempt_index: u32 = 0;
        let mut cushion_ticks = self.config.cushion_ticks;

        tracing::info!(
            symbol = %target.symbol,
            side = %target.side,
            mode = %target.mode,
            target_notional_usd = %target.target_notional_usd,
            "executing target"
        );

        loop {
            let remaining = target.remaining_notional_usd();
            if remaining <= Decimal::ZERO {
                return self.finish(ExecutionStatus::Success, None, target, attempts);
            }

            // Kill switch is checked before each new attempt, never
            // mid-attempt: a polling attempt runs to its natural
            // terminal state so no open order is left unmanaged.
            if self.kill_switch.is_tripped() {
                let status = if target.filled_notional_usd > Decimal::ZERO {
                    ExecutionStatus::Partial
                } else {
                    ExecutionStatus::Aborted
                };
                return self.finish(status, Some(FailureReason::KillSwitch), target, attempts);
            }

            // A residual under the exchange floor cannot be ordered.
            if remaining < target.min_fill_notional_usd {
                let status = if target.filled_notional_usd > Decimal::ZERO {
                    ExecutionStatus::Partial
                } else {
                    ExecutionStatus::Failed
                };
                return self.finish(
                    status,
                    Some(FailureReason::ResidualBelowExchangeMinimum),
                    target,
                    attempts,
                );
            }

            let ttl = self.config.ttl_for(target.mode, attempt_index);
            let attempt = match self
                .maker_slice(&target, remaining, ttl, &mut cushion_ticks)
                .await
            {
                Ok(attempt) => attempt,
                Err(error) => {
                    tracing::error!(
                        symbol = %target.symbol,
                        error = %error,
                        "fatal exchange error, terminating target"
                    );
                    let status = if target.filled_notional_usd > Decimal::ZERO {
                        ExecutionStatus::Partial
                    } else {
                        ExecutionStatus::Failed
                    };
                    return self.finish(
                        status,
                        Some(FailureReason::ExchangeFatal),
                        target,
                        attempts,
                    );
                }
            };

            let slice_fill = attempt.filled_notional_usd;
            if slice_fill > Decimal::ZERO {
                target.record_fill(slice_fill, attempt.filled_base_units);
                consecutive_no_fill = 0;
                metrics::record_fill(slice_fill);
                tracing::info!(
                    symbol = %target.symbol,
                    slice_fill_usd = %slice_fill,
                    remaining_usd = %target.remaining_notional_usd(),
                    status = %attempt.status,
                    "maker slice filled"
                );
            } else {
                consecutive_no_fill += 1;
                attempt_index += 1;
                tracing::debug!(
                    symbol = %target.symbol,
                    consecutive_no_fill,
                    ttl_secs = ttl.as_secs(),
                    "maker slice expired unfilled"
                );
            }
            attempts.push(attempt);

            let remaining = target.remaining_notional_usd();
            if remaining <= Decimal::ZERO {
                continue;
            }

            // Bounded taker fallback: only for small purge residuals,
            // only once, only if enabled.
            if consecutive_no_fill >= self.config.max_consecutive_no_fill
                && target.mode.is_purge()
                && remaining <= self.config.purge_taker_threshold_usd
                && self.config.allow_taker_fallback
            {
                return self.taker_fallback(target, attempts, remaining).await;
            }

            if consecutive_no_fill >= self.config.max_attempts_per_target {
                tracing::warn!(
                    symbol = %target.symbol,
                    remaining_usd = %remaining,
                    consecutive_no_fill,
                    "attempt ceiling reached without taker qualification"
                );
                let status = if target.filled_notional_usd > Decimal::ZERO {
                    ExecutionStatus::Partial
                } else {
                    ExecutionStatus::Failed
                };
                return self.finish(
                    status,
                    Some(FailureReason::ResidualExceedsThreshold),
                    target,
                    attempts,
                );
            }
        }
    }

    /// Place one post-only slice, widening the cushion on repeated
    /// post-only rejection (never on mere non-fill), then drive it
    /// terminal.
    async fn maker_slice(
        &self,
        target: &ExecutionTarget,
        remaining: Decimal,
        ttl: Duration,
        cushion_ticks: &mut u32,
    ) -> Result<OrderAttempt, ExchangeError> {
        loop {
            let book = self.quote(&target.symbol).await?;
            let price = maker_price(target.side, &book, *cushion_ticks);
            match self
                .executor
                .place(
                    &target.symbol,
                    target.side,
                    OrderKind::PostOnlyLimit,
                    remaining,
                    Some(price),
                    ttl,
                )
                .await
            {
                Ok(mut attempt) => {
                    self.executor.poll_until_terminal(&mut attempt).await?;
                    return Ok(attempt);
                }
                Err(ExchangeError::Rejected(message)) => {
                    if *cushion_ticks < self.config.max_cushion_ticks {
                        *cushion_ticks += 1;
                        tracing::debug!(
                            symbol = %target.symbol,
                            cushion_ticks = *cushion_ticks,
                            reason = %message,
                            "post-only rejected, widening cushion"
                        );
                    } else {
                        // Cushion exhausted: book is moving too fast to
                        // post. Count the slice as a no-fill.
                        tracing::warn!(
                            symbol = %target.symbol,
                            cushion_ticks = *cushion_ticks,
                            "post-only rejected at max cushion, counting slice as no-fill"
                        );
                        let mut attempt = OrderAttempt::new(
                            &target.symbol,
                            target.side,
                            OrderKind::PostOnlyLimit,
                            remaining,
                            Some(price),
                            ttl,
                        );
                        attempt.status = AttemptStatus::Failed;
                        return Ok(attempt);
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// The single permitted taker attempt: sized at the full remainder,
    /// priced inside the slippage budget. Terminal either way.
    async fn taker_fallback(
        &self,
        mut target: ExecutionTarget,
        mut attempts: Vec<OrderAttempt>,
        remaining: Decimal,
    ) -> ExecutionResult {
        if self.kill_switch.is_tripped() {
            let status = if target.filled_notional_usd > Decimal::ZERO {
                ExecutionStatus::Partial
            } else {
                ExecutionStatus::Aborted
            };
            return self.finish(status, Some(FailureReason::KillSwitch), target, attempts);
        }

        metrics::record_taker_fallback();
        tracing::info!(
            symbol = %target.symbol,
            remaining_usd = %remaining,
            max_slippage_bps = target.max_slippage_bps,
            "escalating to taker fallback"
        );

        let book = match self.quote(&target.symbol).await {
            Ok(book) => book,
            Err(error) => {
                tracing::error!(symbol = %target.symbol, error = %error, "quote failed for taker fallback");
                return self.finish(
                    ExecutionStatus::Failed,
                    Some(FailureReason::ExchangeFatal),
                    target,
                    attempts,
                );
            }
        };
        let price = taker_limit_price(target.side, &book, target.max_slippage_bps);

        match self
            .executor
            .place(
                &target.symbol,
                target.side,
                OrderKind::LimitIoc,
                remaining,
                Some(price),
                Duration::ZERO,
            )
            .await
        {
            Ok(mut attempt) => {
                if let Err(error) = self.executor.poll_until_terminal(&mut attempt).await {
                    tracing::error!(error = %error, "taker attempt lost to fatal error");
                    attempts.push(attempt);
                    return self.finish(
                        ExecutionStatus::Failed,
                        Some(FailureReason::ExchangeFatal),
                        target,
                        attempts,
                    );
                }

                let filled = attempt.filled_notional_usd;
                if filled > Decimal::ZERO {
                    target.record_fill(filled, attempt.filled_base_units);
                    metrics::record_fill(filled);
                }
                attempts.push(attempt);

                if target.remaining_notional_usd() <= Decimal::ZERO {
                    self.finish(ExecutionStatus::Success, None, target, attempts)
                } else if filled > Decimal::ZERO {
                    self.finish(ExecutionStatus::Partial, None, target, attempts)
                } else {
                    self.finish(
                        ExecutionStatus::Failed,
                        Some(FailureReason::TakerFallbackFailed),
                        target,
                        attempts,
                    )
                }
            }
            Err(error) => {
                // No further retries: an unbounded retry loop against an
                // illiquid book is worse than a bounded loss.
                tracing::warn!(
                    symbol = %target.symbol,
                    error = %error,
                    "taker fallback failed, terminating"
                );
                let status = if target.filled_notional_usd > Decimal::ZERO {
                    ExecutionStatus::Partial
                } else {
                    ExecutionStatus::Failed
                };
                self.finish(
                    status,
                    Some(FailureReason::TakerFallbackFailed),
                    target,
                    attempts,
                )
            }
        }
    }

    /// Top-of-book quote, admitted on the public channel with the
    /// transient-retry budget.
    async fn quote(&self, symbol: &str) -> Result<TopOfBook, ExchangeError> {
        let mut backoff = Backoff::new(&self.config.retry);
        loop {
            self.admission.acquire(Channel::Public, 1.0).await;
            match self.exchange.quote(symbol).await {
                Ok(book) => return Ok(book),
                Err(error) if error.is_retryable() => match backoff.next_backoff() {
                    Some(delay) => {
                        tracing::warn!(error = %error, "transient quote error, retrying");
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        return Err(ExchangeError::Fatal(format!(
                            "quote retries exhausted for {symbol}: {error}"
                        )));
                    }
                },
                Err(error) => return Err(error),
            }
        }
    }

    fn finish(
        &self,
        status: ExecutionStatus,
        reason: Option<FailureReason>,
        target: ExecutionTarget,
        attempts: Vec<OrderAttempt>,
    ) -> ExecutionResult {
        metrics::record_target_outcome(status.to_string().as_str());
        tracing::info!(
            symbol = %target.symbol,
            status = %status,
            reason = ?reason,
            filled_notional_usd = %target.filled_notional_usd,
            attempts = attempts.len(),
            "target terminal"
        );
        ExecutionResult {
            status,
            reason,
            filled_notional_usd: target.filled_notional_usd,
            filled_base_units: target.filled_base_units,
            attempts,
        }
    }
}
