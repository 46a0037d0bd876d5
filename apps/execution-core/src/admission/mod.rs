//! Admission controller: per-channel token-bucket rate limiting.
//!
//! Every exchange-facing call passes through [`AdmissionController::acquire`]
//! before the network call is issued. Two channels are configured:
//! "public" for unauthenticated market data and "private" for
//! account-scoped trading calls. Each channel owns its bucket behind its
//! own mutex; cross-channel calls never block each other, and no lock
//! spans both channels.
//!
//! # Waiter fairness
//!
//! The blocking acquire sleeps for the computed token deficit and then
//! re-contends; no ordering across waiters is guaranteed, so starvation
//! is possible under sustained contention. This is a deliberate
//! trade-off favoring simplicity over FIFO wakeup.

mod budget;
mod controller;
mod stats;

pub use budget::RateBudget;
pub use controller::{AdmissionController, AdmissionError, AdmissionSnapshot, Channel};
pub use stats::AdmissionStats;
