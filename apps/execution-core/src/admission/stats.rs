//! Cumulative admission statistics per channel.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cumulative stats for one channel, updated on every successful acquire
/// and read by alerting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionStats {
    /// Total successful acquires.
    pub acquired: u64,
    /// Total time spent waiting for tokens.
    pub total_wait: Duration,
    /// Acquires that had to wait at least once.
    pub throttle_events: u64,
    /// `1 - tokens/capacity` after the most recent acquire.
    pub utilization: f64,
}

impl AdmissionStats {
    /// Record a successful acquire and the bucket state it left behind.
    pub fn record(&mut self, waited: Duration, utilization: f64) {
        self.acquired += 1;
        self.total_wait += waited;
        if !waited.is_zero() {
            self.throttle_events += 1;
        }
        self.utilization = utilization;
    }

    /// Mean wait per acquire.
    #[must_use]
    pub fn mean_wait(&self) -> Duration {
        if self.acquired == 0 {
            return Duration::ZERO;
        }
        self.total_wait / u32::try_from(self.acquired).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_throttle_only_on_wait() {
        let mut stats = AdmissionStats::default();
        stats.record(Duration::ZERO, 0.25);
        stats.record(Duration::from_millis(100), 0.5);
        assert_eq!(stats.acquired, 2);
        assert_eq!(stats.throttle_events, 1);
        assert_eq!(stats.total_wait, Duration::from_millis(100));
        assert_eq!(stats.utilization, 0.5);
    }

    #[test]
    fn mean_wait_handles_zero_acquires() {
        let stats = AdmissionStats::default();
        assert_eq!(stats.mean_wait(), Duration::ZERO);
    }
}
