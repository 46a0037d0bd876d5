//! End-to-end tests for the escalation loop over the full stack:
//! admission controller, attempt executor, and scripted exchange.
//!
//! Scenarios covered:
//! - Purge TWAP: expired maker slices escalating into one bounded taker
//! - Normal-mode exhaustion without taker escalation
//! - Kill-switch abort before and between attempts
//! - Admission accounting matching observed exchange traffic

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use execution_core::config::{AdmissionConfig, ExecutionConfig};
use execution_core::exchange::{ExchangePort, MockExchange, OrderScript, TopOfBook};
use execution_core::models::{
    AttemptStatus, ExecutionMode, ExecutionStatus, ExecutionTarget, FailureReason, OrderKind,
    OrderSide, Tier,
};
use execution_core::{AdmissionController, Channel, EscalationEngine, KillSwitch};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn admission() -> Arc<AdmissionController> {
    Arc::new(AdmissionController::new(&AdmissionConfig::default()).expect("valid config"))
}

fn purge_sell_target(notional: Decimal) -> ExecutionTarget {
    ExecutionTarget::new(
        "SOL-USD",
        OrderSide::Sell,
        notional,
        Tier::T2,
        ExecutionMode::Purge,
        100,
        dec!(1),
    )
}

#[tokio::test(start_paused = true)]
async fn purge_twap_escalates_to_taker_and_completes() {
    let exchange = Arc::new(MockExchange::default());
    // First maker slice rests through its 25s TTL, second through 20s,
    // then the taker sweeps the full residual.
    exchange.script(OrderScript::RestUnfilled);
    exchange.script(OrderScript::RestUnfilled);
    exchange.script(OrderScript::TakerFill { fraction: dec!(1) });

    let admission = admission();
    let engine = EscalationEngine::new(
        Arc::clone(&admission),
        Arc::clone(&exchange) as Arc<dyn ExchangePort>,
        ExecutionConfig::default(),
        KillSwitch::new(),
    );

    let result = engine.execute(purge_sell_target(dec!(16.19))).await;

    assert_eq!(result.status, ExecutionStatus::Success);
    assert_eq!(result.reason, None);
    assert_eq!(result.filled_notional_usd, dec!(16.19));

    assert_eq!(result.attempts.len(), 3);
    let maker_first = &result.attempts[0];
    let maker_retry = &result.attempts[1];
    let taker = &result.attempts[2];

    assert_eq!(maker_first.kind, OrderKind::PostOnlyLimit);
    assert_eq!(maker_first.status, AttemptStatus::Expired);
    assert_eq!(maker_first.ttl.as_secs(), 25);
    // Sell cushion of one tick above the 100.10 ask.
    assert_eq!(maker_first.limit_price, Some(dec!(100.11)));

    assert_eq!(maker_retry.status, AttemptStatus::Expired);
    assert_eq!(maker_retry.ttl.as_secs(), 20);

    assert_eq!(taker.kind, OrderKind::LimitIoc);
    assert_eq!(taker.status, AttemptStatus::Filled);
    // Sell taker floor = bid * (1 - 100bps) = 100.00 * 0.99.
    assert_eq!(taker.limit_price, Some(dec!(99)));
    assert_eq!(taker.filled_notional_usd, dec!(16.19));
}

#[tokio::test(start_paused = true)]
async fn normal_mode_exhausts_without_taker() {
    let exchange = Arc::new(MockExchange::default());
    for _ in 0..6 {
        exchange.script(OrderScript::RestUnfilled);
    }

    let engine = EscalationEngine::new(
        admission(),
        Arc::clone(&exchange) as Arc<dyn ExchangePort>,
        ExecutionConfig::default(),
        KillSwitch::new(),
    );

    let mut target = purge_sell_target(dec!(16.19));
    target.mode = ExecutionMode::Normal;
    let result = engine.execute(target).await;

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(result.reason, Some(FailureReason::ResidualExceedsThreshold));
    assert_eq!(result.filled_notional_usd, Decimal::ZERO);
    assert_eq!(result.attempts.len(), 6);
    assert!(
        result
            .attempts
            .iter()
            .all(|a| a.kind == OrderKind::PostOnlyLimit),
        "normal mode must never place taker orders"
    );
    // TTL schedule: 12s first, 8s retries.
    assert_eq!(result.attempts[0].ttl.as_secs(), 12);
    assert!(result.attempts[1..].iter().all(|a| a.ttl.as_secs() == 8));
}

#[tokio::test(start_paused = true)]
async fn large_purge_residual_stays_maker_only() {
    let exchange = Arc::new(MockExchange::default());
    for _ in 0..6 {
        exchange.script(OrderScript::RestUnfilled);
    }

    let engine = EscalationEngine::new(
        admission(),
        Arc::clone(&exchange) as Arc<dyn ExchangePort>,
        ExecutionConfig::default(),
        KillSwitch::new(),
    );

    // Residual above the $50 purge threshold never qualifies for taker.
    let result = engine.execute(purge_sell_target(dec!(75))).await;

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(result.reason, Some(FailureReason::ResidualExceedsThreshold));
    assert!(
        result
            .attempts
            .iter()
            .all(|a| a.kind == OrderKind::PostOnlyLimit)
    );
}

#[tokio::test(start_paused = true)]
async fn kill_switch_between_attempts_preserves_partial_fill() {
    let exchange = Arc::new(MockExchange::default());
    exchange.script(OrderScript::PartialFillAfterPolls {
        polls: 1,
        fraction: dec!(0.5),
    });

    let kill_switch = KillSwitch::new();
    let engine = EscalationEngine::new(
        admission(),
        Arc::clone(&exchange) as Arc<dyn ExchangePort>,
        ExecutionConfig::default(),
        kill_switch.clone(),
    );

    // The switch trips while the first attempt is in flight; the attempt
    // still runs to its terminal state before the loop observes it.
    let handle = tokio::spawn(async move { engine.execute(purge_sell_target(dec!(100))).await });
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    kill_switch.trip("manual halt");
    let result = handle.await.expect("execute task panicked");

    assert_eq!(result.status, ExecutionStatus::Partial);
    assert_eq!(result.reason, Some(FailureReason::KillSwitch));
    assert_eq!(result.filled_notional_usd, dec!(50));
    assert_eq!(result.attempts.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn admission_accounting_matches_exchange_traffic() {
    let exchange = Arc::new(MockExchange::default());
    exchange.script(OrderScript::RestUnfilled);
    exchange.script(OrderScript::FillAfterPolls { polls: 2 });

    let admission = admission();
    let engine = EscalationEngine::new(
        Arc::clone(&admission),
        Arc::clone(&exchange) as Arc<dyn ExchangePort>,
        ExecutionConfig::default(),
        KillSwitch::new(),
    );

    let result = engine.execute(purge_sell_target(dec!(40))).await;
    assert_eq!(result.status, ExecutionStatus::Success);

    // Every exchange call was admitted through its channel exactly once.
    let private = admission.stats(Channel::Private).await;
    let public = admission.stats(Channel::Public).await;
    assert_eq!(private.acquired, exchange.private_calls());
    assert_eq!(public.acquired, exchange.public_calls());
    assert!(public.acquired >= 2, "each maker slice re-quotes the book");
}

#[tokio::test(start_paused = true)]
async fn custom_book_prices_flow_through_to_orders() {
    let exchange = Arc::new(MockExchange::new(TopOfBook {
        bid: dec!(2500.00),
        ask: dec!(2500.50),
        tick: dec!(0.25),
    }));
    exchange.script(OrderScript::FillAfterPolls { polls: 1 });

    let engine = EscalationEngine::new(
        admission(),
        Arc::clone(&exchange) as Arc<dyn ExchangePort>,
        ExecutionConfig::default(),
        KillSwitch::new(),
    );

    let target = ExecutionTarget::new(
        "ETH-USD",
        OrderSide::Buy,
        dec!(250),
        Tier::T1,
        ExecutionMode::Normal,
        50,
        dec!(1),
    );
    let result = engine.execute(target).await;

    assert_eq!(result.status, ExecutionStatus::Success);
    // Buy maker rests one tick under the bid.
    assert_eq!(result.attempts[0].limit_price, Some(dec!(2499.75)));
}
