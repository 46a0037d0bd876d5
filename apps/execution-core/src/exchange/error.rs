//! Exchange error taxonomy.
//!
//! Exchange-specific error codes are mapped into this small set at the
//! adapter boundary; the execution core never sees raw wire errors.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by an exchange port implementation.
#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    /// The exchange refused the order as submitted, e.g. a post-only
    /// limit that would cross the book. Attempt-local: the caller may
    /// re-price and resubmit.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// Network or 5xx-equivalent failure. Safe to retry with the same
    /// parameters.
    #[error("transient exchange error: {0}")]
    Transient(String),

    /// 429-equivalent. Unexpected under correct admission control; the
    /// caller should back off and re-check its own bucket state.
    #[error("exchange rate limit hit, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested wait before retrying.
        retry_after: Duration,
    },

    /// The referenced order is unknown to the exchange.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// Anything else: authentication failures, malformed requests,
    /// exhausted retries. Not retryable.
    #[error("fatal exchange error: {0}")]
    Fatal(String),
}

impl ExchangeError {
    /// Returns true if retrying the same request can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::RateLimited { .. })
    }
}
