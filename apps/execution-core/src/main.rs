//! Execution Core Binary
//!
//! Runs the rate-limited execution engine against a scripted in-process
//! exchange, driving one purge target from maker slices through the
//! taker fallback. Useful as a smoke run and as a live demonstration of
//! the admission accounting.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin execution-core
//! ```
//!
//! # Environment Variables
//!
//! ## Optional
//! - `EXECUTION_CONFIG`: Path to a JSON config file (default: built-in defaults)
//! - `METRICS_ADDR`: Prometheus listener address, e.g. `127.0.0.1:9090` (default: disabled)
//! - `RUST_LOG`: Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;

use execution_core::config::CoreConfig;
use execution_core::exchange::{ExchangePort, MockExchange, OrderScript};
use execution_core::models::{ExecutionMode, ExecutionTarget, OrderSide, Tier};
use execution_core::sizing::{self, SizingInput};
use execution_core::{AdmissionController, Channel, EscalationEngine, KillSwitch, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_tracing();

    let config = load_config()?;
    if let Ok(addr) = std::env::var("METRICS_ADDR") {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("invalid METRICS_ADDR: {addr}"))?;
        observability::init_metrics(addr).context("failed to install metrics exporter")?;
        tracing::info!(%addr, "prometheus exporter listening");
    }

    let admission = Arc::new(AdmissionController::new(&config.admission)?);

    // Size the demo target the way the portfolio layer would.
    let sized = sizing::clamp(&SizingInput {
        requested_size_pct: Decimal::new(140, 2),
        account_value_usd: Decimal::from(1_200),
        per_asset_headroom_usd: Decimal::from(100),
        tier_cap_usd: Decimal::from(60),
        position_count_cap_usd: Decimal::from(80),
        min_notional_usd: config.sizing.min_notional_usd,
    })?;
    anyhow::ensure!(!sized.is_rejected(), "demo sizing rejected: {:?}", sized.clamp);
    tracing::info!(
        notional_usd = %sized.notional_usd,
        clamp = ?sized.clamp,
        "sized demo target"
    );

    // Scripted book: two maker slices rest unfilled, then the taker
    // fallback sweeps the residual inside the slippage cap.
    let exchange = Arc::new(MockExchange::default());
    exchange.script(OrderScript::PartialFillAfterPolls {
        polls: 3,
        fraction: Decimal::new(5, 1),
    });
    exchange.script(OrderScript::RestUnfilled);
    exchange.script(OrderScript::RestUnfilled);
    exchange.script(OrderScript::TakerFill {
        fraction: Decimal::ONE,
    });

    let engine = EscalationEngine::new(
        Arc::clone(&admission),
        Arc::clone(&exchange) as Arc<dyn ExchangePort>,
        config.execution.clone(),
        KillSwitch::new(),
    );

    let target = ExecutionTarget::new(
        "SOL-USD",
        OrderSide::Sell,
        sized.notional_usd,
        Tier::T2,
        ExecutionMode::Purge,
        config.execution.taker_max_slippage_bps,
        Decimal::ONE,
    );

    let result = engine.execute(target).await;
    tracing::info!(
        status = %result.status,
        reason = ?result.reason,
        filled_notional_usd = %result.filled_notional_usd,
        attempts = result.attempts.len(),
        "demo target complete"
    );

    let snapshot = admission.snapshot().await;
    for (channel, stats) in [
        (Channel::Public, &snapshot.public),
        (Channel::Private, &snapshot.private),
    ] {
        tracing::info!(
            channel = channel.as_str(),
            acquired = stats.acquired,
            throttle_events = stats.throttle_events,
            mean_wait_ms = stats.mean_wait().as_millis() as u64,
            "admission accounting"
        );
    }
    tracing::info!(
        exchange_private_calls = exchange.private_calls(),
        exchange_public_calls = exchange.public_calls(),
        "exchange call accounting"
    );

    Ok(())
}

fn load_config() -> anyhow::Result<CoreConfig> {
    match std::env::var("EXECUTION_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {path}"))?;
            let config = CoreConfig::from_json_str(&raw)
                .with_context(|| format!("invalid config in {path}"))?;
            tracing::info!(%path, "loaded configuration");
            Ok(config)
        }
        Err(_) => {
            let config = CoreConfig::default();
            config.validate()?;
            tracing::info!("using default configuration");
            Ok(config)
        }
    }
}
