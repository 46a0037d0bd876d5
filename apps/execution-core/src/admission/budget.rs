//! Token-bucket state for one channel.

use std::time::Duration;

use tokio::time::Instant;

/// Token bucket for one logical channel.
///
/// Invariant: `0 <= tokens <= capacity` after every operation. All
/// mutation happens under the owning channel's mutex in
/// [`super::AdmissionController`].
#[derive(Debug, Clone)]
pub struct RateBudget {
    capacity: f64,
    refill_rate: f64,
    tokens: f64,
    last_refill: Instant,
}

impl RateBudget {
    /// Create a full bucket.
    ///
    /// Callers validate `refill_rate > 0` and `capacity > 0` at
    /// configuration time; this constructor trusts its inputs.
    #[must_use]
    pub fn new(capacity: f64, refill_rate: f64, now: Instant) -> Self {
        Self {
            capacity,
            refill_rate,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Add tokens for the time elapsed since the last refill, capped at
    /// capacity.
    pub fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Consume `cost` tokens if available.
    pub fn try_consume(&mut self, cost: f64) -> bool {
        if self.tokens >= cost {
            self.tokens = (self.tokens - cost).max(0.0);
            true
        } else {
            false
        }
    }

    /// Minimum wait until `cost` tokens could be available, assuming no
    /// other consumers in the meantime.
    #[must_use]
    pub fn wait_for(&self, cost: f64) -> Duration {
        let deficit = cost - self.tokens;
        if deficit <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(deficit / self.refill_rate)
    }

    /// Current token count.
    #[must_use]
    pub const fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Burst capacity.
    #[must_use]
    pub const fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Fraction of the bucket currently consumed, in `[0, 1]`.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        1.0 - self.tokens / self.capacity
    }
}
