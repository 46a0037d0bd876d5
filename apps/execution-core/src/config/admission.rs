//! Rate-limit configuration per channel.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Burst capacity is fixed at twice the sustained rate.
const BURST_FACTOR: f64 = 2.0;

/// Sustained request rates per channel, in requests per second.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Sustained rate for unauthenticated market-data calls.
    pub public_sustained_per_sec: f64,
    /// Sustained rate for authenticated trading calls.
    pub private_sustained_per_sec: f64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            public_sustained_per_sec: 10.0,
            private_sustained_per_sec: 15.0,
        }
    }
}

impl AdmissionConfig {
    /// Burst capacity of the public channel.
    #[must_use]
    pub fn public_burst_capacity(&self) -> f64 {
        self.public_sustained_per_sec * BURST_FACTOR
    }

    /// Burst capacity of the private channel.
    #[must_use]
    pub fn private_burst_capacity(&self) -> f64 {
        self.private_sustained_per_sec * BURST_FACTOR
    }

    /// Reject non-positive rates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRate`] naming the offending channel.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.public_sustained_per_sec <= 0.0 || !self.public_sustained_per_sec.is_finite() {
            return Err(ConfigError::InvalidRate {
                channel: "public",
                rate: self.public_sustained_per_sec,
            });
        }
        if self.private_sustained_per_sec <= 0.0 || !self.private_sustained_per_sec.is_finite() {
            return Err(ConfigError::InvalidRate {
                channel: "private",
                rate: self.private_sustained_per_sec,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rates_match_exchange_limits() {
        let config = AdmissionConfig::default();
        assert_eq!(config.public_sustained_per_sec, 10.0);
        assert_eq!(config.private_sustained_per_sec, 15.0);
        assert_eq!(config.public_burst_capacity(), 20.0);
        assert_eq!(config.private_burst_capacity(), 30.0);
    }

    #[test]
    fn rejects_zero_rate() {
        let config = AdmissionConfig {
            private_sustained_per_sec: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("private"));
    }

    #[test]
    fn rejects_nan_rate() {
        let config = AdmissionConfig {
            public_sustained_per_sec: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
