//! Escalation loop and attempt policy configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::exchange::RetryPolicy;
use crate::models::ExecutionMode;

use super::ConfigError;

/// Policy knobs for the escalation (TWAP/purge) loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// TTL of the first maker slice for normal targets, in seconds.
    pub normal_first_ttl_secs: u64,
    /// TTL of retry maker slices for normal targets, in seconds.
    pub normal_retry_ttl_secs: u64,
    /// TTL of the first maker slice for purge targets, in seconds.
    ///
    /// Purge TTLs are longer because thin books need more time to reach
    /// top-of-book.
    pub purge_first_ttl_secs: u64,
    /// TTL of retry maker slices for purge targets, in seconds.
    pub purge_retry_ttl_secs: u64,
    /// Consecutive zero-fill slices before taker fallback qualifies.
    pub max_consecutive_no_fill: u32,
    /// Global ceiling on consecutive zero-fill slices before giving up.
    pub max_attempts_per_target: u32,
    /// Master switch for the single taker fallback attempt.
    pub allow_taker_fallback: bool,
    /// Purge residuals at or under this notional qualify for taker
    /// fallback; the absolute dollar risk of the capped slippage stays
    /// bounded.
    pub purge_taker_threshold_usd: Decimal,
    /// Slippage cap applied to the taker fallback, in basis points.
    pub taker_max_slippage_bps: u32,
    /// Initial maker price cushion, in ticks away from best bid/ask.
    pub cushion_ticks: u32,
    /// Widest cushion reachable on repeated post-only rejection.
    pub max_cushion_ticks: u32,
    /// Interval between order-status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Retry policy for transient exchange errors.
    pub retry: RetryPolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            normal_first_ttl_secs: 12,
            normal_retry_ttl_secs: 8,
            purge_first_ttl_secs: 25,
            purge_retry_ttl_secs: 20,
            max_consecutive_no_fill: 2,
            max_attempts_per_target: 6,
            allow_taker_fallback: true,
            purge_taker_threshold_usd: Decimal::from(50),
            taker_max_slippage_bps: 100,
            cushion_ticks: 1,
            max_cushion_ticks: 5,
            poll_interval_ms: 1_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl ExecutionConfig {
    /// TTL for a slice: first vs retry schedule, per mode.
    #[must_use]
    pub const fn ttl_for(&self, mode: ExecutionMode, attempt_index: u32) -> Duration {
        let secs = match (mode, attempt_index) {
            (ExecutionMode::Normal, 0) => self.normal_first_ttl_secs,
            (ExecutionMode::Normal, _) => self.normal_retry_ttl_secs,
            (ExecutionMode::Purge, 0) => self.purge_first_ttl_secs,
            (ExecutionMode::Purge, _) => self.purge_retry_ttl_secs,
        };
        Duration::from_secs(secs)
    }

    /// Interval between status polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate the policy knobs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ttls = [
            self.normal_first_ttl_secs,
            self.normal_retry_ttl_secs,
            self.purge_first_ttl_secs,
            self.purge_retry_ttl_secs,
        ];
        if ttls.contains(&0) {
            return Err(ConfigError::Validation(
                "slice TTLs must be positive".to_string(),
            ));
        }
        if self.max_consecutive_no_fill == 0 {
            return Err(ConfigError::Validation(
                "max_consecutive_no_fill must be at least 1".to_string(),
            ));
        }
        if self.max_attempts_per_target < self.max_consecutive_no_fill {
            return Err(ConfigError::Validation(
                "max_attempts_per_target must be >= max_consecutive_no_fill".to_string(),
            ));
        }
        if self.taker_max_slippage_bps > 10_000 {
            return Err(ConfigError::Validation(format!(
                "taker_max_slippage_bps {} exceeds 10000",
                self.taker_max_slippage_bps
            )));
        }
        if self.max_cushion_ticks < self.cushion_ticks {
            return Err(ConfigError::Validation(
                "max_cushion_ticks must be >= cushion_ticks".to_string(),
            ));
        }
        if self.purge_taker_threshold_usd < Decimal::ZERO {
            return Err(ConfigError::Validation(
                "purge_taker_threshold_usd cannot be negative".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_schedule_matches_documented_defaults() {
        let config = ExecutionConfig::default();
        assert_eq!(
            config.ttl_for(ExecutionMode::Normal, 0),
            Duration::from_secs(12)
        );
        assert_eq!(
            config.ttl_for(ExecutionMode::Normal, 3),
            Duration::from_secs(8)
        );
        assert_eq!(
            config.ttl_for(ExecutionMode::Purge, 0),
            Duration::from_secs(25)
        );
        assert_eq!(
            config.ttl_for(ExecutionMode::Purge, 1),
            Duration::from_secs(20)
        );
    }

    #[test]
    fn rejects_zero_ttl() {
        let config = ExecutionConfig {
            purge_retry_ttl_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_cushion_wider_than_max() {
        let config = ExecutionConfig {
            cushion_ticks: 6,
            max_cushion_ticks: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_attempt_ceiling_below_no_fill_threshold() {
        let config = ExecutionConfig {
            max_consecutive_no_fill: 4,
            max_attempts_per_target: 3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
