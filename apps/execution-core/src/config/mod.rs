//! Configuration for the execution core.
//!
//! Values only: loading and file discovery belong to the outer process.
//! Every section carries the documented defaults and a `validate()` that
//! turns misconfiguration into a startup [`ConfigError`] instead of a
//! call-time surprise.

mod admission;
mod execution;
mod sizing;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use admission::AdmissionConfig;
pub use execution::ExecutionConfig;
pub use sizing::SizingConfig;

/// Configuration errors, all fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A rate-limit channel was configured with a non-positive rate.
    #[error("channel '{channel}' has non-positive sustained rate {rate}")]
    InvalidRate {
        /// Channel label.
        channel: &'static str,
        /// Offending rate value.
        rate: f64,
    },

    /// A field failed validation.
    #[error("config validation failed: {0}")]
    Validation(String),

    /// Failed to parse a configuration document.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level configuration for the execution core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Per-channel rate limits.
    pub admission: AdmissionConfig,
    /// Escalation loop and attempt policy.
    pub execution: ExecutionConfig,
    /// Sizing floors.
    pub sizing: SizingConfig,
}

impl CoreConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.admission.validate()?;
        self.execution.validate()?;
        self.sizing.validate()
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on parse or validation failure.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }
}
