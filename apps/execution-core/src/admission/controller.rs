//! Shared admission controller guarding the exchange request budget.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::{AdmissionConfig, ConfigError};
use crate::observability::metrics;

use super::budget::RateBudget;
use super::stats::AdmissionStats;

/// Logical request channel. Unknown channels are unrepresentable, so a
/// misconfigured channel is a startup error rather than a call-time one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Unauthenticated market data calls.
    Public,
    /// Authenticated, account-scoped trading calls.
    Private,
}

impl Channel {
    /// Lowercase label used in logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from non-blocking admission.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// A non-blocking acquire would have had to wait.
    #[error("acquire on '{channel}' would throttle: need {needed}, have {available:.3}")]
    WouldThrottle {
        /// Channel that was short on tokens.
        channel: Channel,
        /// Tokens requested.
        needed: f64,
        /// Tokens available at the time of the call.
        available: f64,
    },
}

/// Point-in-time stats for both channels.
#[derive(Debug, Clone)]
pub struct AdmissionSnapshot {
    /// Public (market data) channel stats.
    pub public: AdmissionStats,
    /// Private (trading) channel stats.
    pub private: AdmissionStats,
}

/// Per-channel bucket plus its stats, guarded together so every refill,
/// consume, and stat update for a channel is one critical section.
#[derive(Debug)]
struct ChannelState {
    budget: RateBudget,
    stats: AdmissionStats,
}

/// Token-bucket admission controller shared by all execution workers.
///
/// Passed by `Arc` reference to every caller that issues exchange calls;
/// there are no ambient globals. It is the single shared mutable resource
/// in the execution core.
#[derive(Debug)]
pub struct AdmissionController {
    public: Mutex<ChannelState>,
    private: Mutex<ChannelState>,
}

impl AdmissionController {
    /// Build the controller from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for non-positive sustained rates; rate
    /// misconfiguration is fatal here, never at call time.
    pub fn new(config: &AdmissionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let now = Instant::now();
        Ok(Self {
            public: Mutex::new(ChannelState {
                budget: RateBudget::new(
                    config.public_burst_capacity(),
                    config.public_sustained_per_sec,
                    now,
                ),
                stats: AdmissionStats::default(),
            }),
            private: Mutex::new(ChannelState {
                budget: RateBudget::new(
                    config.private_burst_capacity(),
                    config.private_sustained_per_sec,
                    now,
                ),
                stats: AdmissionStats::default(),
            }),
        })
    }

    const fn state(&self, channel: Channel) -> &Mutex<ChannelState> {
        match channel {
            Channel::Public => &self.public,
            Channel::Private => &self.private,
        }
    }

    /// Acquire `cost` tokens on `channel`, waiting as long as necessary.
    ///
    /// Returns the total time spent waiting. A zero-cost acquire returns
    /// immediately and leaves both the bucket and the stats untouched.
    ///
    /// The lock is dropped before every sleep, so other callers may take
    /// the refilled tokens first; the loop then recomputes the deficit.
    pub async fn acquire(&self, channel: Channel, cost: f64) -> Duration {
        if cost <= 0.0 {
            return Duration::ZERO;
        }

        let mut waited = Duration::ZERO;
        loop {
            let wait = {
                let mut state = self.state(channel).lock().await;
                state.budget.refill(Instant::now());
                if state.budget.try_consume(cost) {
                    let utilization = state.budget.utilization();
                    state.stats.record(waited, utilization);
                    if !waited.is_zero() {
                        metrics::record_throttle(channel);
                    }
                    metrics::record_acquire_wait(channel, waited);
                    metrics::record_channel_utilization(channel, utilization);
                    return waited;
                }
                state.budget.wait_for(cost)
            };

            tracing::trace!(
                channel = channel.as_str(),
                wait_ms = wait.as_millis(),
                "admission throttled, waiting for refill"
            );
            tokio::time::sleep(wait).await;
            waited += wait;
        }
    }

    /// Non-blocking acquire: consume immediately or fail fast.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::WouldThrottle`] if the bucket cannot
    /// cover `cost` right now.
    pub async fn try_acquire(&self, channel: Channel, cost: f64) -> Result<(), AdmissionError> {
        if cost <= 0.0 {
            return Ok(());
        }

        let mut state = self.state(channel).lock().await;
        state.budget.refill(Instant::now());
        if state.budget.try_consume(cost) {
            let utilization = state.budget.utilization();
            state.stats.record(Duration::ZERO, utilization);
            metrics::record_channel_utilization(channel, utilization);
            return Ok(());
        }
        Err(AdmissionError::WouldThrottle {
            channel,
            needed: cost,
            available: state.budget.tokens(),
        })
    }

    /// Snapshot of one channel's cumulative stats.
    pub async fn stats(&self, channel: Channel) -> AdmissionStats {
        self.state(channel).lock().await.stats.clone()
    }

    /// Snapshot of both channels at once, for periodic reporting.
    pub async fn snapshot(&self) -> AdmissionSnapshot {
        AdmissionSnapshot {
            public: self.stats(Channel::Public).await,
            private: self.stats(Channel::Private).await,
        }
    }

    /// Current token count on one channel, for diagnostics after an
    /// unexpected exchange-side rate limit.
    pub async fn tokens(&self, channel: Channel) -> f64 {
        let mut state = self.state(channel).lock().await;
        state.budget.refill(Instant::now());
        state.budget.tokens()
    }
}
