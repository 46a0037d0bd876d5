//! Observability: tracing initialization and metric recording helpers.
//!
//! The metric names here are consumed by an external exporter pipeline;
//! this crate only records them through the `metrics` facade and, in the
//! binary, installs the Prometheus listener.

pub mod metrics;
pub mod tracing;

pub use metrics::{MetricsError, init_metrics};
pub use tracing::init_tracing;
