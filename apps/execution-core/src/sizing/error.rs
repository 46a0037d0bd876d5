//! Sizing errors.

use thiserror::Error;

/// Errors from the sizing clamp.
///
/// An exposure-cap rejection is not an error: it is a by-design outcome
/// carried in [`super::SizingOutcome`]. This enum covers genuinely
/// invalid input only.
#[derive(Debug, Error)]
pub enum SizingError {
    /// Input failed basic validation (non-positive account value, etc.).
    #[error("invalid sizing input: {0}")]
    InvalidInput(String),
}
