//! Kill switch: cooperative abort for the escalation loop.
//!
//! Checked before each new attempt is placed, never mid-attempt: an
//! attempt already polling runs to its natural terminal state so no open
//! order is left unmanaged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared abort flag. Cloning shares the same underlying switch.
#[derive(Debug, Clone, Default)]
pub struct KillSwitch {
    tripped: Arc<AtomicBool>,
}

impl KillSwitch {
    /// Create an untripped switch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the switch. Idempotent; only the first trip logs.
    pub fn trip(&self, reason: &str) {
        if !self.tripped.swap(true, Ordering::SeqCst) {
            tracing::warn!(reason, "kill switch tripped, no further orders will be placed");
        }
    }

    /// Returns true once tripped.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}
