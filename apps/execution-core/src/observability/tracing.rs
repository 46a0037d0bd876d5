//! Structured logging setup.
//!
//! # Key Spans and Events
//!
//! - `target.execute` - full escalation loop for one target
//! - `attempt.place` / `attempt.poll` / `attempt.cancel` - order lifecycle
//! - admission throttle waits, logged at trace level per acquire

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Filter directives come from `RUST_LOG`, defaulting to `info` for this
/// crate. Safe to call once per process; subsequent calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,execution_core=debug"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
