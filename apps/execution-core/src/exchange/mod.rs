//! Exchange collaborator: opaque transport port, error taxonomy,
//! transient-retry policy, and a scripted mock for tests and demos.
//!
//! The wire protocol is out of scope; this module only defines the
//! request/response contract the execution core consumes. Every call to
//! an implementation must be admitted through the
//! [`crate::admission::AdmissionController`] first; the port itself does
//! no rate limiting.

mod error;
mod mock;
mod port;
mod retry;

pub use error::ExchangeError;
pub use mock::{MockExchange, OrderScript};
pub use port::{
    CancelAck, ExchangePort, Fill, OrderAck, OrderStatusReport, PlaceOrderRequest, TopOfBook,
};
pub use retry::{Backoff, RetryPolicy};
