//! Sizing floor configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Exchange-wide sizing constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Exchange minimum order notional, in USD.
    pub min_notional_usd: Decimal,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            min_notional_usd: Decimal::new(500, 2), // $5.00
        }
    }
}

impl SizingConfig {
    /// Reject a non-positive exchange floor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the floor is not positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_notional_usd <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "min_notional_usd {} must be positive",
                self.min_notional_usd
            )));
        }
        Ok(())
    }
}
